use crate::rng::FastRandom;

/// Classic improved Perlin noise over a seeded 512-entry permutation table,
/// plus the two fractal compositions terrain generation builds on.
#[derive(Clone)]
pub struct PerlinNoise {
    perm: [u8; 512],
}

impl PerlinNoise {
    pub fn new(seed: i32) -> Self {
        let mut rng = FastRandom::new(seed as i64);
        let mut base: [u8; 256] = [0; 256];
        for (i, v) in base.iter_mut().enumerate() {
            *v = i as u8;
        }
        for i in 0..256 {
            let j = (rng.rand_i64().unsigned_abs() % 256) as usize;
            base.swap(i, j);
        }
        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&base);
        perm[256..].copy_from_slice(&base);
        Self { perm }
    }

    /// 3D noise in roughly [-1, 1]. Pure function of the table.
    pub fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let xi = (x.floor() as i64 & 255) as usize;
        let yi = (y.floor() as i64 & 255) as usize;
        let zi = (z.floor() as i64 & 255) as usize;
        let x = x - x.floor();
        let y = y - y.floor();
        let z = z - z.floor();
        let u = fade(x);
        let v = fade(y);
        let w = fade(z);
        let p = &self.perm;
        let a = p[xi] as usize + yi;
        let aa = p[a] as usize + zi;
        let ab = p[a + 1] as usize + zi;
        let b = p[xi + 1] as usize + yi;
        let ba = p[b] as usize + zi;
        let bb = p[b + 1] as usize + zi;
        lerp(
            w,
            lerp(
                v,
                lerp(
                    u,
                    grad(p[aa] as usize, x, y, z),
                    grad(p[ba] as usize, x - 1.0, y, z),
                ),
                lerp(
                    u,
                    grad(p[ab] as usize, x, y - 1.0, z),
                    grad(p[bb] as usize, x - 1.0, y - 1.0, z),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(p[aa + 1] as usize, x, y, z - 1.0),
                    grad(p[ba + 1] as usize, x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(p[ab + 1] as usize, x, y - 1.0, z - 1.0),
                    grad(p[bb + 1] as usize, x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }

    /// Fractional Brownian sum: each octave scales frequency by `lacunarity`
    /// and amplitude by `lacunarity^(-h * i)`.
    pub fn multi_fractal(
        &self,
        mut x: f64,
        mut y: f64,
        mut z: f64,
        octaves: u32,
        lacunarity: f64,
        h: f64,
    ) -> f64 {
        let mut result = 0.0;
        for i in 0..octaves {
            result += self.noise(x, y, z) * lacunarity.powf(-h * i as f64);
            x *= lacunarity;
            y *= lacunarity;
            z *= lacunarity;
        }
        result
    }

    /// Musgrave ridged multifractal: sharp creases from `(offset - |n|)^2`,
    /// octave contribution gated by the previous signal.
    #[allow(clippy::too_many_arguments)]
    pub fn ridged_multi_fractal(
        &self,
        mut x: f64,
        mut y: f64,
        mut z: f64,
        octaves: u32,
        lacunarity: f64,
        h: f64,
        offset: f64,
        gain: f64,
    ) -> f64 {
        let ridge = |n: f64| {
            let r = offset - n.abs();
            r * r
        };
        let mut freq = 1.0;
        let mut signal = ridge(self.noise(x, y, z));
        let mut result = signal;
        for _ in 1..octaves {
            x *= lacunarity;
            y *= lacunarity;
            z *= lacunarity;
            freq *= lacunarity;
            let weight = (gain * signal).clamp(0.0, 1.0);
            signal = ridge(self.noise(x, y, z)) * weight;
            result += signal * freq.powf(-h);
        }
        result
    }
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

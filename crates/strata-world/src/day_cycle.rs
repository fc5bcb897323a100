/// Stepped day/night cycle: daylight drops by 0.2 at a fixed interval and
/// snaps back to full once it reaches dusk. Light grids are untouched by
/// daylight changes; the scalar is folded into vertex colors at mesh
/// time, so a daylight step only forces re-meshing.
pub struct DayCycle {
    daylight: f32,
    elapsed: f32,
    step_interval: f32,
}

pub const DAYLIGHT_STEP: f32 = 0.2;
pub const DAYLIGHT_DUSK: f32 = 0.4;

impl DayCycle {
    pub fn new(step_interval: f32) -> Self {
        Self {
            daylight: 1.0,
            elapsed: 0.0,
            step_interval: step_interval.max(1.0),
        }
    }

    #[inline]
    pub fn daylight(&self) -> f32 {
        self.daylight
    }

    /// Advances sim time. Returns true when daylight changed, meaning
    /// loaded chunks should be queued for re-mesh.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        let mut changed = false;
        while self.elapsed >= self.step_interval {
            self.elapsed -= self.step_interval;
            self.daylight -= DAYLIGHT_STEP;
            if self.daylight <= DAYLIGHT_DUSK + 1e-4 {
                self.daylight = 1.0;
            }
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn steps_down_then_wraps() {
        let mut dc = DayCycle::new(120.0);
        assert_eq!(dc.daylight(), 1.0);
        assert!(!dc.advance(60.0));
        assert!(dc.advance(60.0));
        assert!((dc.daylight() - 0.8).abs() < 1e-6);
        dc.advance(120.0);
        assert!((dc.daylight() - 0.6).abs() < 1e-6);
        // Next step would hit 0.4; it wraps to full day instead.
        dc.advance(120.0);
        assert_eq!(dc.daylight(), 1.0);
    }

    #[test]
    fn multiple_steps_in_one_advance() {
        let mut dc = DayCycle::new(120.0);
        assert!(dc.advance(240.0));
        assert!((dc.daylight() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn daylight_stays_in_band() {
        let mut dc = DayCycle::new(10.0);
        for _ in 0..100 {
            dc.advance(10.0);
            assert!(dc.daylight() > DAYLIGHT_DUSK - 1e-6);
            assert!(dc.daylight() <= 1.0);
        }
    }

    proptest! {
        // Arbitrary frame timings never push daylight outside (dusk, 1].
        #[test]
        fn any_dt_sequence_keeps_daylight_in_band(dts in prop::collection::vec(0.0f32..400.0, 1..50)) {
            let mut dc = DayCycle::new(120.0);
            for dt in dts {
                dc.advance(dt);
                prop_assert!(dc.daylight() > DAYLIGHT_DUSK);
                prop_assert!(dc.daylight() <= 1.0);
            }
        }
    }
}

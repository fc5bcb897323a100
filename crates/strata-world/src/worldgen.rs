use std::path::Path;

use serde::Deserialize;

/// Tunable terrain parameters, loadable from TOML. Every field has a
/// default so a partial file (or none at all) still generates a world.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct WorldGenParams {
    #[serde(default)]
    pub frequencies: Frequencies,
    #[serde(default)]
    pub levels: Levels,
    #[serde(default)]
    pub ores: Ores,
    #[serde(default)]
    pub flora: Flora,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Frequencies {
    #[serde(default = "default_elevation_freq")]
    pub elevation: f64,
    #[serde(default = "default_roughness_freq")]
    pub roughness: f64,
    #[serde(default = "default_detail_freq")]
    pub detail: f64,
    #[serde(default = "default_cave_freq")]
    pub cave: f64,
    #[serde(default = "default_canyon_freq")]
    pub canyon: f64,
    #[serde(default = "default_forest_freq")]
    pub forest: f64,
}
fn default_elevation_freq() -> f64 {
    0.003
}
fn default_roughness_freq() -> f64 {
    0.04
}
fn default_detail_freq() -> f64 {
    0.02
}
fn default_cave_freq() -> f64 {
    0.06
}
fn default_canyon_freq() -> f64 {
    0.01
}
fn default_forest_freq() -> f64 {
    0.8
}
impl Default for Frequencies {
    fn default() -> Self {
        Self {
            elevation: default_elevation_freq(),
            roughness: default_roughness_freq(),
            detail: default_detail_freq(),
            cave: default_cave_freq(),
            canyon: default_canyon_freq(),
            forest: default_forest_freq(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Levels {
    #[serde(default = "default_sea")]
    pub sea: i32,
    #[serde(default = "default_beach_low")]
    pub beach_low: i32,
    #[serde(default = "default_beach_high")]
    pub beach_high: i32,
    #[serde(default = "default_snow")]
    pub snow: i32,
    #[serde(default = "default_lava")]
    pub lava: i32,
    /// Everything below this fraction of the column height is stone.
    #[serde(default = "default_stone_fraction")]
    pub stone_fraction: f64,
}
fn default_sea() -> i32 {
    30
}
fn default_beach_low() -> i32 {
    28
}
fn default_beach_high() -> i32 {
    34
}
fn default_snow() -> i32 {
    90
}
fn default_lava() -> i32 {
    4
}
fn default_stone_fraction() -> f64 {
    0.75
}
impl Default for Levels {
    fn default() -> Self {
        Self {
            sea: default_sea(),
            beach_low: default_beach_low(),
            beach_high: default_beach_high(),
            snow: default_snow(),
            lava: default_lava(),
            stone_fraction: default_stone_fraction(),
        }
    }
}

/// Thresholds on a standard normal draw per stone cell. More negative
/// means rarer.
#[derive(Clone, Debug, Deserialize)]
pub struct Ores {
    #[serde(default = "default_coal")]
    pub coal: f64,
    #[serde(default = "default_silver")]
    pub silver: f64,
    #[serde(default = "default_redstone")]
    pub redstone: f64,
    #[serde(default = "default_gold")]
    pub gold: f64,
    #[serde(default = "default_diamond")]
    pub diamond: f64,
}
fn default_coal() -> f64 {
    -2.0
}
fn default_silver() -> f64 {
    -2.5
}
fn default_redstone() -> f64 {
    -3.0
}
fn default_gold() -> f64 {
    -3.0
}
fn default_diamond() -> f64 {
    -3.4
}
impl Default for Ores {
    fn default() -> Self {
        Self {
            coal: default_coal(),
            silver: default_silver(),
            redstone: default_redstone(),
            gold: default_gold(),
            diamond: default_diamond(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Flora {
    /// A surface grass cell sprouts tall grass when a uniform draw in
    /// [0, 1] exceeds this.
    #[serde(default = "default_grass_prob")]
    pub grass_prob: f64,
    /// Flowers appear where a standard normal draw falls below this.
    #[serde(default = "default_flower_cutoff")]
    pub flower_cutoff: f64,
    /// Forest density band [low, high) grows round trees; at and above
    /// `high`, pines.
    #[serde(default = "default_tree_density_low")]
    pub tree_density_low: f64,
    #[serde(default = "default_tree_density_high")]
    pub tree_density_high: f64,
    /// A lattice cell plants a tree when a uniform draw exceeds this.
    #[serde(default = "default_tree_prob")]
    pub tree_prob: f64,
}
fn default_grass_prob() -> f64 {
    0.85
}
fn default_flower_cutoff() -> f64 {
    -2.0
}
fn default_tree_density_low() -> f64 {
    0.25
}
fn default_tree_density_high() -> f64 {
    0.6
}
fn default_tree_prob() -> f64 {
    0.8
}
impl Default for Flora {
    fn default() -> Self {
        Self {
            grass_prob: default_grass_prob(),
            flower_cutoff: default_flower_cutoff(),
            tree_density_low: default_tree_density_low(),
            tree_density_high: default_tree_density_high(),
            tree_prob: default_tree_prob(),
        }
    }
}

pub fn load_params_from_path(path: &Path) -> Result<WorldGenParams, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("read {}: {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("parse {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let p: WorldGenParams = toml::from_str("").unwrap();
        assert_eq!(p.levels.sea, 30);
        assert_eq!(p.frequencies.elevation, 0.003);
        assert_eq!(p.ores.coal, -2.0);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let p: WorldGenParams = toml::from_str(
            r#"
            [levels]
            sea = 40
            [frequencies]
            cave = 0.1
        "#,
        )
        .unwrap();
        assert_eq!(p.levels.sea, 40);
        assert_eq!(p.levels.beach_low, 28);
        assert_eq!(p.frequencies.cave, 0.1);
        assert_eq!(p.frequencies.canyon, 0.01);
    }
}

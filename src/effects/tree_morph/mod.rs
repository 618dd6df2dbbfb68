//! Tree morph effect
//!
//! Three particle groups (foliage points, ornament spheres, photo cards)
//! plus a tree-topper star. Each particle carries two static target
//! positions generated at construction: a chaos position inside a sphere
//! and a formed position inside the tree cone. One smoothed blend factor
//! per group moves toward the current display mode every frame, and the
//! interpolated positions are written into instance vectors for upload.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use rand::Rng;

use crate::config::TreeConfig;

/// The binary display state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Formed,
    Chaos,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Formed => DisplayMode::Chaos,
            DisplayMode::Chaos => DisplayMode::Formed,
        }
    }

    /// Blend factor this mode pulls toward: 1 = formed, 0 = chaos
    pub fn blend_target(self) -> f32 {
        match self {
            DisplayMode::Formed => 1.0,
            DisplayMode::Chaos => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Formed => "Formed",
            DisplayMode::Chaos => "Chaos",
        }
    }
}

// Palette (sRGB), converted to linear when instances are generated
pub const COLOR_EMERALD_DEEP: [f32; 3] = [0.0, 0.180, 0.149];
pub const COLOR_EMERALD_MID: [f32; 3] = [0.059, 0.239, 0.188];
pub const COLOR_GOLD_METALLIC: [f32; 3] = [1.0, 0.843, 0.0];
pub const COLOR_GOLD_ROSE: [f32; 3] = [0.878, 0.749, 0.722];
pub const COLOR_RED_VELVET: [f32; 3] = [0.533, 0.031, 0.031];
pub const COLOR_WARM_WHITE: [f32; 3] = [1.0, 0.992, 0.816];

/// Smoothing rates per group, in 1/s
const FOLIAGE_BLEND_RATE: f32 = 2.0;
const ORNAMENT_BLEND_RATE: f32 = 1.5;
const CARD_BLEND_RATE: f32 = 1.2;

/// World-space half-size of a foliage point sprite
const FOLIAGE_POINT_SIZE: f32 = 0.08;

/// GPU foliage particle (two vec4s in WGSL)
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct FoliageInstance {
    /// xyz position, w = sprite half-size
    pub pos_size: [f32; 4],
    /// rgb color (linear), a = opacity
    pub color: [f32; 4],
}

/// GPU instance for the ornament/star mesh pipeline
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    /// rgb albedo (linear), a unused
    pub color: [f32; 4],
    /// rgb emissive (linear, pre-scaled), a unused
    pub emissive: [f32; 4],
}

/// GPU instance for the photo card pipeline
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CardInstance {
    pub model: [[f32; 4]; 4],
    /// Texture array layer
    pub layer: u32,
    pub _pad: [u32; 3],
}

struct FoliageSeed {
    chaos: Vec3,
    formed: Vec3,
    color: [f32; 3],
    phase: f32,
}

struct OrnamentSeed {
    chaos: Vec3,
    formed: Vec3,
    color: [f32; 3],
    scale: f32,
    speed: f32,
}

struct CardSeed {
    chaos: Vec3,
    formed: Vec3,
    phase: f32,
    layer: u32,
}

/// The morphing tree
pub struct TreeMorphEffect {
    foliage: Vec<FoliageSeed>,
    ornaments: Vec<OrnamentSeed>,
    cards: Vec<CardSeed>,
    star_formed: Vec3,

    foliage_instances: Vec<FoliageInstance>,
    /// Ornaments followed by the star in the last slot
    mesh_instances: Vec<MeshInstance>,
    card_instances: Vec<CardInstance>,

    foliage_blend: f32,
    ornament_blend: f32,
    card_blend: f32,
    time: f32,
}

impl TreeMorphEffect {
    pub fn new(config: &TreeConfig) -> Self {
        let mut rng = rand::rng();

        let foliage: Vec<FoliageSeed> = (0..config.foliage_count)
            .map(|_| FoliageSeed {
                chaos: sphere_point(&mut rng, config.chaos_radius),
                formed: cone_point(&mut rng, config.tree_height, config.base_radius),
                color: foliage_color(&mut rng),
                phase: rng.random_range(0.0..std::f32::consts::TAU),
            })
            .collect();

        // Ornaments sit slightly inside the foliage cone
        let ornaments: Vec<OrnamentSeed> = (0..config.ornament_count)
            .map(|_| OrnamentSeed {
                chaos: sphere_point(&mut rng, config.chaos_radius * 0.8),
                formed: cone_point(&mut rng, config.tree_height - 1.0, config.base_radius * 0.9),
                color: ornament_color(&mut rng),
                scale: rng.random_range(0.2..0.5),
                speed: rng.random_range(0.5..1.5),
            })
            .collect();

        // Cards spiral up the outside of the cone
        let cards: Vec<CardSeed> = (0..config.card_count)
            .map(|i| {
                let t = i as f32 / config.card_count as f32;
                let angle = t * std::f32::consts::TAU;
                let y = -config.tree_height / 3.0 + i as f32 * 1.5;
                let shrink = 1.0 - (y + config.tree_height / 3.0) / (config.tree_height + 2.0);
                let r = config.base_radius * 1.2 * shrink + 2.0;
                CardSeed {
                    chaos: sphere_point(&mut rng, config.chaos_radius * 1.2),
                    formed: Vec3::new(r * angle.cos(), y, r * angle.sin()),
                    phase: i as f32 * 0.5,
                    layer: i as u32,
                }
            })
            .collect();

        let star_formed = Vec3::new(0.0, config.tree_height / 2.0 + 0.5, 0.0);

        let foliage_count = foliage.len();
        let mesh_count = ornaments.len() + 1;
        let card_count = cards.len();

        let mut effect = Self {
            foliage,
            ornaments,
            cards,
            star_formed,
            foliage_instances: vec![FoliageInstance::zeroed(); foliage_count],
            mesh_instances: vec![MeshInstance::zeroed(); mesh_count],
            card_instances: vec![CardInstance::zeroed(); card_count],
            foliage_blend: 1.0,
            ornament_blend: 1.0,
            card_blend: 1.0,
            time: 0.0,
        };
        // Populate instances so the first frame renders the formed tree
        effect.update(0.0, DisplayMode::Formed);
        effect
    }

    /// Advance the blend factors toward the mode and rebuild instance data
    pub fn update(&mut self, delta: f32, mode: DisplayMode) {
        self.time += delta;
        let target = mode.blend_target();

        self.foliage_blend = approach(self.foliage_blend, target, FOLIAGE_BLEND_RATE, delta);
        self.ornament_blend = approach(self.ornament_blend, target, ORNAMENT_BLEND_RATE, delta);
        self.card_blend = approach(self.card_blend, target, CARD_BLEND_RATE, delta);

        self.update_foliage();
        self.update_ornaments();
        self.update_cards();
    }

    fn update_foliage(&mut self) {
        let f = self.foliage_blend;
        let breathing = f > 0.9;
        for (i, seed) in self.foliage.iter().enumerate() {
            let mut pos = seed.chaos.lerp(seed.formed, f);
            if breathing {
                let n = (self.time + seed.phase).sin() * 0.05;
                pos += Vec3::splat(n);
            }
            self.foliage_instances[i] = FoliageInstance {
                pos_size: [pos.x, pos.y, pos.z, FOLIAGE_POINT_SIZE],
                color: [seed.color[0], seed.color[1], seed.color[2], 0.9],
            };
        }
    }

    fn update_ornaments(&mut self) {
        let f = self.ornament_blend;
        let floating = f < 0.5;
        // Faint warm glow so bloom catches the brightest ornaments
        let glow = srgb_to_linear([0.267, 0.0, 0.0]);
        let emissive = [glow[0] * 0.2, glow[1] * 0.2, glow[2] * 0.2, 0.0];

        for (i, seed) in self.ornaments.iter().enumerate() {
            let mut pos = seed.chaos.lerp(seed.formed, f);
            let rotation = if floating {
                pos.y += (self.time * seed.speed + i as f32).sin() * 0.05;
                Quat::from_euler(
                    glam::EulerRot::XYZ,
                    self.time * seed.speed * 0.2,
                    self.time * seed.speed * 0.1,
                    0.0,
                )
            } else {
                Quat::IDENTITY
            };
            // Grow back to full size while forming
            let scale = seed.scale * (0.5 + 0.5 * f);

            self.mesh_instances[i] = MeshInstance {
                model: Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, pos)
                    .to_cols_array_2d(),
                color: pad_color(seed.color),
                emissive,
            };
        }

        // Star: last mesh slot, scaling up with the ornament blend
        let star_scale = 0.8 * (f * f).max(0.01);
        let star_rot = Quat::from_rotation_y(self.time * 0.3);
        let gold = srgb_to_linear(COLOR_GOLD_METALLIC);
        let star_index = self.mesh_instances.len() - 1;
        self.mesh_instances[star_index] = MeshInstance {
            model: Mat4::from_scale_rotation_translation(
                Vec3::splat(star_scale),
                star_rot,
                self.star_formed,
            )
            .to_cols_array_2d(),
            color: pad_color(COLOR_GOLD_METALLIC),
            emissive: [gold[0] * 2.0, gold[1] * 2.0, gold[2] * 2.0, 0.0],
        };
    }

    fn update_cards(&mut self) {
        let f = self.card_blend;
        for (i, seed) in self.cards.iter().enumerate() {
            let mut pos = seed.chaos.lerp(seed.formed, f);
            pos.y += (self.time + seed.phase).sin() * 0.2;

            // Face the tree axis, with a gentle roll sway
            let to_axis = Vec3::new(-pos.x, 0.0, -pos.z);
            let yaw = to_axis.x.atan2(to_axis.z);
            let roll = (self.time * 0.5 + seed.phase).sin() * 0.1;
            let rotation = Quat::from_rotation_y(yaw) * Quat::from_rotation_z(roll);

            self.card_instances[i] = CardInstance {
                model: Mat4::from_scale_rotation_translation(
                    Vec3::new(1.5, 1.8, 1.0),
                    rotation,
                    pos,
                )
                .to_cols_array_2d(),
                layer: seed.layer,
                _pad: [0; 3],
            };
        }
    }

    pub fn foliage_instances(&self) -> &[FoliageInstance] {
        &self.foliage_instances
    }

    /// Ornament instances with the star in the last slot
    pub fn mesh_instances(&self) -> &[MeshInstance] {
        &self.mesh_instances
    }

    pub fn card_instances(&self) -> &[CardInstance] {
        &self.card_instances
    }

    pub fn foliage_blend(&self) -> f32 {
        self.foliage_blend
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

/// Exponentially approach the target, clamped to [0, 1]
fn approach(current: f32, target: f32, rate: f32, delta: f32) -> f32 {
    let t = 1.0 - (-rate * delta).exp();
    (current + (target - current) * t).clamp(0.0, 1.0)
}

/// Uniform point inside a sphere
fn sphere_point(rng: &mut impl Rng, radius: f32) -> Vec3 {
    let u: f32 = rng.random_range(0.0..1.0);
    let v: f32 = rng.random_range(0.0..1.0);
    let theta = std::f32::consts::TAU * u;
    let phi = (2.0 * v - 1.0).acos();
    let r = rng.random_range(0.0f32..1.0).cbrt() * radius;
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

/// Uniform point inside a cone standing on the y axis, centered vertically
fn cone_point(rng: &mut impl Rng, height: f32, base_radius: f32) -> Vec3 {
    let y = rng.random_range(0.0..height) - height / 2.0;
    let normalized_y = (y + height / 2.0) / height;
    let max_radius = base_radius * (1.0 - normalized_y);

    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let r = rng.random_range(0.0f32..1.0).sqrt() * max_radius;
    Vec3::new(r * angle.cos(), y, r * angle.sin())
}

/// Deep emerald ramp with a metallic gold sprinkle
fn foliage_color(rng: &mut impl Rng) -> [f32; 3] {
    if rng.random_range(0.0..1.0f32) > 0.8 {
        srgb_to_linear(COLOR_GOLD_METALLIC)
    } else {
        let t: f32 = rng.random_range(0.0..1.0);
        let mixed = [
            COLOR_EMERALD_DEEP[0] + (COLOR_EMERALD_MID[0] - COLOR_EMERALD_DEEP[0]) * t,
            COLOR_EMERALD_DEEP[1] + (COLOR_EMERALD_MID[1] - COLOR_EMERALD_DEEP[1]) * t,
            COLOR_EMERALD_DEEP[2] + (COLOR_EMERALD_MID[2] - COLOR_EMERALD_DEEP[2]) * t,
        ];
        srgb_to_linear(mixed)
    }
}

/// Red velvet, gold or warm white
fn ornament_color(rng: &mut impl Rng) -> [f32; 3] {
    let pick: f32 = rng.random_range(0.0..1.0);
    let srgb = if pick < 0.5 {
        COLOR_RED_VELVET
    } else if pick < 0.75 {
        COLOR_GOLD_METALLIC
    } else {
        COLOR_WARM_WHITE
    };
    srgb_to_linear(srgb)
}

fn pad_color(rgb: [f32; 3]) -> [f32; 4] {
    let lin = srgb_to_linear(rgb);
    [lin[0], lin[1], lin[2], 1.0]
}

/// Piecewise sRGB to linear conversion
pub fn srgb_to_linear(c: [f32; 3]) -> [f32; 3] {
    fn channel(v: f32) -> f32 {
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    }
    [channel(c[0]), channel(c[1]), channel(c[2])]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TreeConfig {
        TreeConfig {
            foliage_count: 200,
            ornament_count: 30,
            card_count: 8,
            tree_height: 12.0,
            base_radius: 4.5,
            chaos_radius: 25.0,
        }
    }

    #[test]
    fn test_sphere_point_in_bounds() {
        let mut rng = rand::rng();
        for _ in 0..1000 {
            let p = sphere_point(&mut rng, 25.0);
            assert!(p.length() <= 25.0 + 1e-3);
        }
    }

    #[test]
    fn test_cone_point_in_bounds() {
        let mut rng = rand::rng();
        let height = 12.0;
        let base = 4.5;
        for _ in 0..1000 {
            let p = cone_point(&mut rng, height, base);
            assert!(p.y >= -height / 2.0 - 1e-3 && p.y <= height / 2.0 + 1e-3);
            let normalized_y = (p.y + height / 2.0) / height;
            let max_r = base * (1.0 - normalized_y);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!(r <= max_r + 1e-3, "r {} exceeds cone radius {}", r, max_r);
        }
    }

    #[test]
    fn test_approach_converges_and_clamps() {
        let mut f = 0.0;
        for _ in 0..200 {
            let prev = f;
            f = approach(f, 1.0, 2.0, 1.0 / 60.0);
            assert!(f >= prev);
            assert!((0.0..=1.0).contains(&f));
        }
        assert!(f > 0.95);

        // A huge step must not overshoot
        assert_eq!(approach(0.0, 1.0, 2.0, 1000.0), 1.0);
        assert_eq!(approach(1.0, 0.0, 2.0, 1000.0), 0.0);
    }

    #[test]
    fn test_instance_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FoliageInstance>(), 32);
        assert_eq!(std::mem::size_of::<MeshInstance>(), 96);
        assert_eq!(std::mem::size_of::<CardInstance>(), 80);
    }

    #[test]
    fn test_counts_fixed_after_updates() {
        let config = test_config();
        let mut effect = TreeMorphEffect::new(&config);
        let foliage = effect.foliage_instances().len();
        let meshes = effect.mesh_instances().len();
        let cards = effect.card_instances().len();

        for _ in 0..120 {
            effect.update(1.0 / 60.0, DisplayMode::Chaos);
        }
        assert_eq!(effect.foliage_instances().len(), foliage);
        assert_eq!(effect.mesh_instances().len(), meshes);
        assert_eq!(effect.card_instances().len(), cards);

        assert_eq!(foliage, config.foliage_count);
        assert_eq!(meshes, config.ornament_count + 1);
        assert_eq!(cards, config.card_count);
    }

    #[test]
    fn test_blend_moves_toward_mode() {
        let mut effect = TreeMorphEffect::new(&test_config());
        assert!(effect.foliage_blend() > 0.99);

        for _ in 0..60 {
            effect.update(1.0 / 60.0, DisplayMode::Chaos);
        }
        let mid = effect.foliage_blend();
        assert!(mid < 0.5, "blend should fall toward chaos, got {}", mid);

        for _ in 0..600 {
            effect.update(1.0 / 60.0, DisplayMode::Formed);
        }
        assert!(effect.foliage_blend() > 0.9);
    }

    #[test]
    fn test_star_shrinks_in_chaos() {
        let mut effect = TreeMorphEffect::new(&test_config());
        let scale_of = |e: &TreeMorphEffect| {
            let m = e.mesh_instances().last().unwrap().model;
            // Length of the first basis column is the uniform scale
            (m[0][0] * m[0][0] + m[0][1] * m[0][1] + m[0][2] * m[0][2]).sqrt()
        };

        let formed_scale = scale_of(&effect);
        for _ in 0..600 {
            effect.update(1.0 / 60.0, DisplayMode::Chaos);
        }
        let chaos_scale = scale_of(&effect);
        assert!(chaos_scale < formed_scale * 0.1);
        assert!(chaos_scale > 0.0);
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(DisplayMode::Formed.toggled(), DisplayMode::Chaos);
        assert_eq!(DisplayMode::Chaos.toggled(), DisplayMode::Formed);
        assert_eq!(DisplayMode::Formed.blend_target(), 1.0);
        assert_eq!(DisplayMode::Chaos.blend_target(), 0.0);
    }

    #[test]
    fn test_srgb_to_linear_range() {
        let black = srgb_to_linear([0.0, 0.0, 0.0]);
        let white = srgb_to_linear([1.0, 1.0, 1.0]);
        assert_eq!(black, [0.0, 0.0, 0.0]);
        for c in white {
            assert!((c - 1.0).abs() < 1e-5);
        }
        // Linearization darkens midtones
        let mid = srgb_to_linear([0.5, 0.5, 0.5]);
        assert!(mid[0] < 0.5 && mid[0] > 0.0);
    }
}

// Scene state: turns the entity store, focus, and cruise state into the
// flat sprite/line buffers the GPU layer uploads each frame.
//
// Owns a bevy_ecs World holding the animated entities (star glows, dust
// motes), the static background shell, and the cached connector lines.
// Everything here is CPU-side; main.rs owns the wgpu objects.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::camera::OrbitCamera;
use super::components::{Mote, Sprite, StarGlow, Transform, Twinkle, Velocity};
use super::neighbors::{NEIGHBOR_COUNT, select_neighbors};
use super::star::{StarField, StarId};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Background shell point count and radial band.
const BACKGROUND_COUNT: usize = 2000;
const BACKGROUND_RADIUS_MIN: f32 = 300.0;
const BACKGROUND_RADIUS_SPAN: f32 = 700.0;
/// Slow global yaw of the background shell, radians/sec.
const BACKGROUND_SPIN: f32 = 0.005;

/// Dust mote count and bounding box (full extents, centered on the origin).
const MOTE_COUNT: usize = 200;
const MOTE_BOUNDS: Vec3 = Vec3::new(100.0, 60.0, 100.0);
/// Sway amplitude around the mote's base point.
const MOTE_SWAY: f32 = 2.0;

/// Vertical bob amplitude for idle stars.
const STAR_BOB: f32 = 0.09;
/// Scale-ease rate toward the emphasis target, 1/sec.
const STAR_SCALE_RATE: f32 = 5.0;
/// Emphasized stars pulse at 4 rad/s with this amplitude.
const STAR_PULSE: f32 = 0.3;

/// The cruise beam ends this far in front of the camera.
const BEAM_AHEAD: f32 = 10.0;

// Palette. Indigo family, matching the glow texture's white core.
const COLOR_STAR_IDLE: [f32; 4] = [1.0, 1.0, 1.0, 0.5];
const COLOR_STAR_EMPHASIS: [f32; 4] = [0.506, 0.549, 0.973, 1.0];
const COLOR_STAR_CORE: [f32; 4] = [0.878, 0.906, 1.0, 0.9];
const COLOR_BACKGROUND: [f32; 4] = [0.506, 0.549, 0.973, 0.8];
const COLOR_MOTE: [f32; 4] = [0.647, 0.706, 0.988, 0.3];
const COLOR_LINK: [f32; 4] = [0.506, 0.549, 0.973, 0.6];
const COLOR_BEAM: [f32; 4] = [0.388, 0.4, 0.945, 0.2];

// ============================================================================
// GPU-FACING DATA
// ============================================================================

/// One billboard sprite instance. Layout matches shader_sprites.wgsl:
///   @location(1) center, @location(2) size, @location(3) color
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteInstance {
    pub center: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

impl SpriteInstance {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// One endpoint of a colored line segment for shader_lines.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Everything the GPU layer needs for one frame, already flattened.
pub struct FrameSnapshot {
    pub sprites: Vec<SpriteInstance>,
    pub lines: Vec<LineVertex>,
}

/// RGBA8 pixels for the shared radial glow texture: white-hot core fading
/// through indigo to transparent. Generated once at renderer init and owned
/// by the renderer — no global texture singletons.
pub fn glow_pixels(size: usize) -> Vec<u8> {
    // (radial position, premixed RGBA) gradient stops.
    const STOPS: [(f32, [f32; 4]); 4] = [
        (0.0, [1.0, 1.0, 1.0, 1.0]),
        (0.15, [0.647, 0.706, 0.988, 0.9]),
        (0.5, [0.388, 0.4, 0.945, 0.4]),
        (1.0, [0.0, 0.0, 0.0, 0.0]),
    ];

    let mut pixels = Vec::with_capacity(size * size * 4);
    let center = (size as f32 - 1.0) / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 - center) / center;
            let dy = (y as f32 - center) / center;
            let r = (dx * dx + dy * dy).sqrt().min(1.0);

            let mut color = STOPS[STOPS.len() - 1].1;
            for pair in STOPS.windows(2) {
                let (r0, c0) = pair[0];
                let (r1, c1) = pair[1];
                if r <= r1 {
                    let t = if r1 > r0 { (r - r0) / (r1 - r0) } else { 0.0 };
                    color = [
                        c0[0] + (c1[0] - c0[0]) * t,
                        c0[1] + (c1[1] - c0[1]) * t,
                        c0[2] + (c1[2] - c0[2]) * t,
                        c0[3] + (c1[3] - c0[3]) * t,
                    ];
                    break;
                }
            }
            for channel in color {
                pixels.push((channel * 255.0) as u8);
            }
        }
    }
    pixels
}

/// How a star should be emphasized this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarState {
    Idle,
    /// The star the user selected / is viewing.
    Active,
    /// The autonomous cruise's current highlight.
    Highlighted,
}

/// Resolve a star's visual state from the focus and cruise targets.
pub fn star_state(id: StarId, viewing: Option<StarId>, cruise: Option<StarId>) -> StarState {
    if viewing == Some(id) {
        StarState::Active
    } else if cruise == Some(id) {
        StarState::Highlighted
    } else {
        StarState::Idle
    }
}

// ============================================================================
// SCENE STATE
// ============================================================================

pub struct SceneState {
    world: World,
    /// Stars already mirrored into the world. The store is append-only, so a
    /// count is enough to know what is new.
    synced_stars: usize,
    rng: StdRng,

    background: Vec<Vec3>,
    background_yaw: f32,

    link_anchor: Option<StarId>,
    links: Vec<(Vec3, Vec3)>,
}

impl SceneState {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        // Background shell: uniform directions, radii in a thick band.
        let background = (0..BACKGROUND_COUNT)
            .map(|_| {
                let r = BACKGROUND_RADIUS_MIN + rng.r#gen::<f32>() * BACKGROUND_RADIUS_SPAN;
                let theta = rng.r#gen::<f32>() * std::f32::consts::TAU;
                let phi = (2.0 * rng.r#gen::<f32>() - 1.0).acos();
                Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                )
            })
            .collect();

        let mut world = World::new();
        for _ in 0..MOTE_COUNT {
            let base = Vec3::new(
                (rng.r#gen::<f32>() - 0.5) * MOTE_BOUNDS.x,
                (rng.r#gen::<f32>() - 0.5) * MOTE_BOUNDS.y,
                (rng.r#gen::<f32>() - 0.5) * MOTE_BOUNDS.z,
            );
            let drift = Vec3::new(
                (rng.r#gen::<f32>() - 0.5) * 0.4,
                (rng.r#gen::<f32>() - 0.5) * 0.2,
                (rng.r#gen::<f32>() - 0.5) * 0.4,
            );
            world.spawn((
                Transform::from_position(base),
                Velocity::new(drift),
                Mote {
                    phase: rng.r#gen::<f32>() * std::f32::consts::TAU,
                    sway_speed: rng.r#gen::<f32>() * 0.2 + 0.05,
                },
                Sprite {
                    size: 0.12,
                    color: COLOR_MOTE,
                },
            ));
        }

        Self {
            world,
            synced_stars: 0,
            rng,
            background,
            background_yaw: 0.0,
            link_anchor: None,
            links: Vec::new(),
        }
    }

    /// Current connector segments (anchor → neighbor), for tests and HUD.
    pub fn links(&self) -> &[(Vec3, Vec3)] {
        &self.links
    }

    /// Mirror newly appended stars into the scene world.
    fn sync_stars(&mut self, field: &StarField) {
        let stars = field.all();
        for star in &stars[self.synced_stars..] {
            self.world.spawn((
                Transform::from_position(star.position),
                StarGlow {
                    id: star.id,
                    base: star.position,
                    phase: self.rng.r#gen::<f32>() * std::f32::consts::TAU,
                    scale: 0.01,
                    twinkle: Twinkle {
                        countdown: self.rng.r#gen::<f32>() * 10.0,
                        progress: 0.0,
                        bursting: false,
                    },
                },
                Sprite {
                    size: 2.0,
                    color: COLOR_STAR_IDLE,
                },
            ));
        }
        self.synced_stars = stars.len();
    }

    /// Recompute connector lines when the anchor changed (including to/from
    /// none). Neighbor selection is the same call the answer panel uses.
    fn refresh_links(&mut self, field: &StarField, anchor: Option<StarId>) {
        if anchor == self.link_anchor {
            return;
        }
        self.link_anchor = anchor;
        self.links.clear();

        let Some(root) = anchor.and_then(|id| field.get(id)) else {
            return;
        };
        for neighbor in select_neighbors(root, field.all(), NEIGHBOR_COUNT) {
            self.links.push((root.position, neighbor.position));
        }
    }

    /// Advance all scene animation and flatten the frame's draw data.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        field: &StarField,
        viewing: Option<StarId>,
        anchor: Option<StarId>,
        cruise_target: Option<StarId>,
        camera: &OrbitCamera,
        dt: f32,
        elapsed: f32,
    ) -> FrameSnapshot {
        self.sync_stars(field);
        self.refresh_links(field, anchor);
        self.background_yaw += BACKGROUND_SPIN * dt;

        let mut sprites =
            Vec::with_capacity(self.background.len() + MOTE_COUNT + self.synced_stars * 2);

        // Background shell, spun slowly about Y.
        let spin = Quat::from_rotation_y(self.background_yaw);
        for &p in &self.background {
            sprites.push(SpriteInstance {
                center: (spin * p).to_array(),
                size: 1.6,
                color: COLOR_BACKGROUND,
            });
        }

        // Dust motes: linear drift wrapped in the bounds box + sway.
        let half = MOTE_BOUNDS / 2.0;
        let mut motes = self
            .world
            .query::<(&mut Transform, &Velocity, &Mote, &Sprite)>();
        for (mut transform, velocity, mote, sprite) in motes.iter_mut(&mut self.world) {
            let mut base = transform.position + velocity.linear * dt;
            // Wrap around so the cloud never thins out.
            for axis in 0..3 {
                if base[axis] > half[axis] {
                    base[axis] = -half[axis];
                } else if base[axis] < -half[axis] {
                    base[axis] = half[axis];
                }
            }
            transform.position = base;

            let sway = Vec3::new(
                (elapsed * mote.sway_speed + mote.phase).sin(),
                (elapsed * mote.sway_speed + mote.phase).cos(),
                0.0,
            ) * MOTE_SWAY;
            let pulse = 0.5 + (elapsed * 2.0 + mote.phase).sin() * 0.3;
            sprites.push(SpriteInstance {
                center: (base + sway).to_array(),
                size: sprite.size * (1.0 + pulse),
                color: sprite.color,
            });
        }

        // Star glows: bob, twinkle, emphasis easing.
        let mut rng_bursts: Vec<f32> = Vec::new();
        let mut stars_q = self.world.query::<(&mut Transform, &mut StarGlow)>();
        for (mut transform, mut glow) in stars_q.iter_mut(&mut self.world) {
            let state = star_state(glow.id, viewing, cruise_target);
            let emphasized = state != StarState::Idle;

            let mut twinkle_scale = 0.0;
            if !emphasized {
                if glow.twinkle.bursting {
                    glow.twinkle.progress += dt * 5.0;
                    if glow.twinkle.progress >= std::f32::consts::PI {
                        glow.twinkle.bursting = false;
                    } else {
                        twinkle_scale = glow.twinkle.progress.sin() * 0.8;
                    }
                } else {
                    glow.twinkle.countdown -= dt;
                    if glow.twinkle.countdown <= 0.0 {
                        glow.twinkle.bursting = true;
                        glow.twinkle.progress = 0.0;
                        // Defer RNG pull: the query borrows `self.world`, the
                        // RNG lives on `self`, so collect and apply after.
                        rng_bursts.push(0.0);
                    }
                }
            }

            let target_scale = if emphasized { 1.2 } else { 1.0 };
            let t = (dt * STAR_SCALE_RATE).min(1.0);
            glow.scale += (target_scale - glow.scale) * t;

            let pulse = if emphasized {
                (elapsed * 4.0).sin() * STAR_PULSE
            } else {
                0.0
            };
            let scale = glow.scale + pulse + twinkle_scale;

            let bob = (elapsed + glow.phase).sin() * STAR_BOB;
            transform.position = glow.base + Vec3::new(0.0, bob, 0.0);

            let (glow_size, glow_color) = if emphasized {
                (1.8 * scale, COLOR_STAR_EMPHASIS)
            } else {
                (2.0 * scale, COLOR_STAR_IDLE)
            };
            sprites.push(SpriteInstance {
                center: transform.position.to_array(),
                size: glow_size,
                color: glow_color,
            });
            sprites.push(SpriteInstance {
                center: transform.position.to_array(),
                size: 0.35 * scale,
                color: COLOR_STAR_CORE,
            });
        }

        // Re-arm the twinkle countdowns that expired this frame.
        if !rng_bursts.is_empty() {
            let fresh: Vec<f32> = rng_bursts
                .iter()
                .map(|_| 5.0 + self.rng.r#gen::<f32>() * 10.0)
                .collect();
            let mut i = 0;
            let mut stars_q = self.world.query::<&mut StarGlow>();
            for mut glow in stars_q.iter_mut(&mut self.world) {
                if glow.twinkle.bursting && glow.twinkle.progress == 0.0 && i < fresh.len() {
                    glow.twinkle.countdown = fresh[i];
                    i += 1;
                }
            }
        }

        // Lines: anchor connectors plus the cruise beam.
        let mut lines = Vec::with_capacity(self.links.len() * 2 + 2);
        for &(from, to) in &self.links {
            lines.push(LineVertex {
                position: from.to_array(),
                color: COLOR_LINK,
            });
            lines.push(LineVertex {
                position: to.to_array(),
                color: COLOR_LINK,
            });
        }
        if let Some(star) = cruise_target.and_then(|id| field.get(id)) {
            let hud_point = camera.position + camera.facing() * BEAM_AHEAD;
            lines.push(LineVertex {
                position: star.position.to_array(),
                color: COLOR_BEAM,
            });
            lines.push(LineVertex {
                position: hud_point.to_array(),
                color: COLOR_BEAM,
            });
        }

        FrameSnapshot { sprites, lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::star::Star;

    fn field_with_topic_line() -> StarField {
        let mut field = StarField::new();
        for i in 0..5 {
            let id = field.next_id();
            field.add(
                Star::new(id, format!("q{i}"), Vec3::new(i as f32 * 10.0, 0.0, 0.0))
                    .with_topic("Science"),
            );
        }
        field
    }

    fn update_once(
        scene: &mut SceneState,
        field: &StarField,
        anchor: Option<StarId>,
        cruise: Option<StarId>,
    ) -> FrameSnapshot {
        let camera = OrbitCamera::new();
        scene.update(field, anchor, anchor, cruise, &camera, 1.0 / 60.0, 1.0)
    }

    #[test]
    fn snapshot_contains_all_layers() {
        let field = field_with_topic_line();
        let mut scene = SceneState::new(1);
        let snap = update_once(&mut scene, &field, None, None);
        // Shell + motes + two sprites per star.
        assert_eq!(snap.sprites.len(), BACKGROUND_COUNT + MOTE_COUNT + 5 * 2);
    }

    #[test]
    fn connectors_root_at_the_anchor() {
        let field = field_with_topic_line();
        let anchor = field.all()[0].id;
        let mut scene = SceneState::new(1);
        update_once(&mut scene, &field, Some(anchor), None);

        let root_pos = field.get(anchor).unwrap().position;
        assert_eq!(scene.links().len(), 3);
        for (from, _) in scene.links() {
            assert_eq!(*from, root_pos);
        }

        // Segments end at the same stars the answer panel lists.
        let expected: Vec<Vec3> =
            select_neighbors(field.get(anchor).unwrap(), field.all(), NEIGHBOR_COUNT)
                .iter()
                .map(|s| s.position)
                .collect();
        let actual: Vec<Vec3> = scene.links().iter().map(|(_, to)| *to).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn links_persist_until_the_anchor_changes() {
        let field = field_with_topic_line();
        let a = field.all()[0].id;
        let b = field.all()[4].id;
        let mut scene = SceneState::new(1);

        update_once(&mut scene, &field, Some(a), None);
        let before: Vec<(Vec3, Vec3)> = scene.links().to_vec();

        // Same anchor, more frames: untouched.
        update_once(&mut scene, &field, Some(a), None);
        assert_eq!(scene.links(), &before[..]);

        // New anchor: recomputed from the new root.
        update_once(&mut scene, &field, Some(b), None);
        assert_ne!(scene.links(), &before[..]);
        assert_eq!(scene.links()[0].0, field.get(b).unwrap().position);

        // Cleared anchor: no connectors at all.
        update_once(&mut scene, &field, None, None);
        assert!(scene.links().is_empty());
    }

    #[test]
    fn cruise_target_adds_a_beam_segment() {
        let field = field_with_topic_line();
        let target = field.all()[2].id;
        let mut scene = SceneState::new(1);

        let without = update_once(&mut scene, &field, None, None);
        let with = update_once(&mut scene, &field, None, Some(target));
        assert_eq!(with.lines.len(), without.lines.len() + 2);
        assert_eq!(
            with.lines[with.lines.len() - 2].position,
            field.get(target).unwrap().position.to_array()
        );
    }

    #[test]
    fn star_state_resolution() {
        let viewing = Some(StarId(1));
        let cruise = Some(StarId(2));
        assert_eq!(star_state(StarId(1), viewing, cruise), StarState::Active);
        assert_eq!(star_state(StarId(2), viewing, cruise), StarState::Highlighted);
        assert_eq!(star_state(StarId(3), viewing, cruise), StarState::Idle);
        // Viewing wins when both point at the same star.
        assert_eq!(
            star_state(StarId(1), viewing, Some(StarId(1))),
            StarState::Active
        );
    }

    #[test]
    fn glow_texture_is_hot_centered_and_transparent_edged() {
        let size = 64;
        let pixels = glow_pixels(size);
        assert_eq!(pixels.len(), size * size * 4);

        let at = |x: usize, y: usize| {
            let i = (y * size + x) * 4;
            [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
        };
        let center = at(size / 2, size / 2);
        assert!(center[0] > 240 && center[3] > 240, "core not white-hot");
        let corner = at(0, 0);
        assert_eq!(corner[3], 0, "corner not transparent");
    }

    #[test]
    fn late_appended_stars_get_sprites_too() {
        let mut field = field_with_topic_line();
        let mut scene = SceneState::new(1);
        update_once(&mut scene, &field, None, None);

        let id = field.next_id();
        field.add(Star::new(id, "newcomer", Vec3::new(0.0, 20.0, 0.0)));
        let snap = update_once(&mut scene, &field, None, None);
        assert_eq!(snap.sprites.len(), BACKGROUND_COUNT + MOTE_COUNT + 6 * 2);
    }
}

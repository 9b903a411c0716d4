//! Procedural fallback textures for when configured image files are missing.
//!
//! The backdrop fallback is a deterministic star field with layered noise
//! wisps, baked into an equirectangular image matching the backdrop sphere's
//! UV mapping. Body fallbacks are tinted checkerboards seeded by body name,
//! so the same scene always produces the same stand-in art.

use std::hash::{Hash, Hasher};

use noise::{NoiseFn, Simplex};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A single star in the procedural backdrop catalog.
#[derive(Clone, Debug)]
pub struct StarPoint {
    /// Unit direction vector on the sky sphere.
    pub direction: glam::Vec3,
    /// Brightness in [0.0, 1.0] where 1.0 is the brightest visible star.
    pub brightness: f32,
    /// Color temperature mapped to RGB. Blue-white (high temp) to red (low temp).
    pub color: [f32; 3],
}

/// Generates a deterministic catalog of stars from a seed.
pub struct StarfieldGenerator {
    seed: u64,
    star_count: u32,
}

impl StarfieldGenerator {
    /// Create a new generator with the given seed and star count.
    pub fn new(seed: u64, star_count: u32) -> Self {
        Self { seed, star_count }
    }

    /// Generate the star catalog. Deterministic for a given seed.
    pub fn generate(&self) -> Vec<StarPoint> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut stars = Vec::with_capacity(self.star_count as usize);

        for _ in 0..self.star_count {
            let theta = rng.random::<f32>() * std::f32::consts::TAU;
            let phi = (1.0 - 2.0 * rng.random::<f32>()).acos();

            let direction =
                glam::Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());

            // Power-law: many dim stars, few bright ones.
            let raw: f32 = rng.random();
            let brightness = raw.powf(4.0).clamp(0.0, 1.0);

            let temperature = 2000.0 + brightness * 28000.0;
            let color = blackbody_to_rgb(temperature);

            stars.push(StarPoint {
                direction,
                brightness,
                color,
            });
        }

        stars
    }
}

/// Convert a blackbody temperature in Kelvin to an approximate sRGB color.
///
/// Uses a simplified Planckian locus approximation (Tanner Helland algorithm).
pub fn blackbody_to_rgb(temperature_k: f32) -> [f32; 3] {
    let t = temperature_k / 100.0;
    let r = if t <= 66.0 {
        1.0
    } else {
        (329.698_73 * (t - 60.0).powf(-0.133_204_76) / 255.0).clamp(0.0, 1.0)
    };
    let g = if t <= 66.0 {
        (99.470_8 * t.ln() - 161.119_57).clamp(0.0, 255.0) / 255.0
    } else {
        (288.122_17 * (t - 60.0).powf(-0.075_514_85) / 255.0).clamp(0.0, 1.0)
    };
    let b = if t >= 66.0 {
        1.0
    } else if t <= 19.0 {
        0.0
    } else {
        (138.517_73 * (t - 10.0).ln() - 305.044_8).clamp(0.0, 255.0) / 255.0
    };
    [r, g, b]
}

/// Map a unit direction to equirectangular UV coordinates in [0, 1).
///
/// Matches the UV layout of the generated sphere mesh: U wraps around the Y
/// axis, V runs 0 at the north pole to 1 at the south pole.
pub fn direction_to_equirect(dir: glam::Vec3) -> (f32, f32) {
    let u = (dir.z.atan2(dir.x) / std::f32::consts::TAU).rem_euclid(1.0);
    let v = dir.y.clamp(-1.0, 1.0).acos() / std::f32::consts::PI;
    (u, v)
}

/// Inverse of [`direction_to_equirect`].
pub fn equirect_to_direction(u: f32, v: f32) -> glam::Vec3 {
    let theta = u * std::f32::consts::TAU;
    let phi = v * std::f32::consts::PI;
    glam::Vec3::new(
        phi.sin() * theta.cos(),
        phi.cos(),
        phi.sin() * theta.sin(),
    )
}

/// One colored layer of noise wisps behind the stars.
#[derive(Clone, Debug)]
pub struct WispLayer {
    /// Layer color in linear RGB.
    pub color: [f32; 3],
    /// Maximum opacity. Kept low so stars show through.
    pub max_opacity: f32,
    /// Base noise frequency. Lower = larger clouds.
    pub frequency: f64,
    /// Number of noise octaves.
    pub octaves: u32,
    /// Amplitude decay per octave.
    pub persistence: f64,
    /// Frequency increase per octave.
    pub lacunarity: f64,
    /// Offset distinguishing this layer from others with the same seed.
    pub offset: glam::DVec3,
}

/// The fixed wisp palette layered over the fallback star field.
fn wisp_layers() -> [WispLayer; 4] {
    [
        WispLayer {
            color: [0.4, 0.1, 0.6], // purple
            max_opacity: 0.12,
            frequency: 1.5,
            octaves: 5,
            persistence: 0.45,
            lacunarity: 2.2,
            offset: glam::DVec3::new(0.0, 0.0, 0.0),
        },
        WispLayer {
            color: [0.1, 0.2, 0.7], // blue
            max_opacity: 0.10,
            frequency: 2.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: glam::DVec3::new(100.0, 0.0, 0.0),
        },
        WispLayer {
            color: [0.7, 0.2, 0.5], // pink
            max_opacity: 0.08,
            frequency: 2.5,
            octaves: 4,
            persistence: 0.4,
            lacunarity: 2.3,
            offset: glam::DVec3::new(0.0, 100.0, 0.0),
        },
        WispLayer {
            color: [0.8, 0.4, 0.1], // orange
            max_opacity: 0.06,
            frequency: 3.0,
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: glam::DVec3::new(0.0, 0.0, 100.0),
        },
    ]
}

/// Power curve exponent for wispy falloff. Higher values produce sparser,
/// more filamentary structures.
const WISP_EXPONENT: f32 = 3.0;

/// Samples layered fractal noise wisps over the sky sphere.
pub struct WispField {
    noise: Simplex,
    layers: [WispLayer; 4],
}

impl WispField {
    /// Create a new field from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            noise: Simplex::new(seed as u32),
            layers: wisp_layers(),
        }
    }

    /// Sample one layer at a sky direction. Returns premultiplied RGBA.
    fn sample_layer(&self, direction: glam::DVec3, layer: &WispLayer) -> [f32; 4] {
        let mut total = 0.0_f64;
        let mut frequency = layer.frequency;
        let mut amplitude = 1.0_f64;

        for _ in 0..layer.octaves {
            let p = direction * frequency + layer.offset;
            total += self.noise.get([p.x, p.y, p.z]) * amplitude;
            frequency *= layer.lacunarity;
            amplitude *= layer.persistence;
        }

        // Remap from [-1, 1] to [0, 1], then sharpen into filaments.
        let normalized = ((total + 1.0) * 0.5).clamp(0.0, 1.0);
        let wisped = (normalized as f32).powf(WISP_EXPONENT);
        let opacity = wisped * layer.max_opacity;

        [
            layer.color[0] * opacity,
            layer.color[1] * opacity,
            layer.color[2] * opacity,
            opacity,
        ]
    }

    /// Sample all layers at a sky direction and composite them. Returns
    /// premultiplied RGBA with total opacity clamped so stars show through.
    pub fn sample(&self, direction: glam::DVec3) -> [f32; 4] {
        let mut result = [0.0_f32; 4];

        for layer in &self.layers {
            let layer_color = self.sample_layer(direction, layer);
            result[0] += layer_color[0];
            result[1] += layer_color[1];
            result[2] += layer_color[2];
            result[3] += layer_color[3];
        }

        result[3] = result[3].clamp(0.0, 0.5);
        result
    }
}

/// An equirectangular backdrop image under construction, RGBA f32 pixels.
pub struct BackdropImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl BackdropImage {
    /// Splat a star catalog onto a black canvas.
    pub fn render(stars: &[StarPoint], width: u32, height: u32) -> Self {
        let mut pixels = vec![[0.0, 0.0, 0.0, 1.0]; (width * height) as usize];

        for star in stars {
            let (u, v) = direction_to_equirect(star.direction);
            let px = ((u * width as f32) as u32).min(width - 1);
            let py = ((v * height as f32) as u32).min(height - 1);
            let idx = (py * width + px) as usize;

            // Additive blend: multiple dim stars in the same pixel accumulate.
            // The boost floor keeps even dim stars visible without bloom.
            let b = star.brightness * 8.0 + 0.4;
            let pixel = &mut pixels[idx];
            pixel[0] = (pixel[0] + star.color[0] * b).min(1.0);
            pixel[1] = (pixel[1] + star.color[1] * b).min(1.0);
            pixel[2] = (pixel[2] + star.color[2] * b).min(1.0);

            // Bright stars bleed into neighbors for a glow effect.
            if star.brightness > 0.3 {
                let glow = star.brightness * 2.0;
                let offsets: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
                for (dx, dy) in offsets {
                    let nx = px as i32 + dx;
                    let ny = py as i32 + dy;
                    if nx >= 0 && nx < width as i32 && ny >= 0 && ny < height as i32 {
                        let ni = (ny as u32 * width + nx as u32) as usize;
                        let np = &mut pixels[ni];
                        np[0] = (np[0] + star.color[0] * glow * 0.3).min(1.0);
                        np[1] = (np[1] + star.color[1] * glow * 0.3).min(1.0);
                        np[2] = (np[2] + star.color[2] * glow * 0.3).min(1.0);
                    }
                }
            }
        }

        Self {
            width,
            height,
            pixels,
        }
    }

    /// Blend noise wisps onto the star field, additively.
    pub fn apply_wisps(&mut self, field: &WispField) {
        for y in 0..self.height {
            for x in 0..self.width {
                let u = (x as f32 + 0.5) / self.width as f32;
                let v = (y as f32 + 0.5) / self.height as f32;
                let direction = equirect_to_direction(u, v).as_dvec3();

                let wisp = field.sample(direction);
                let pixel = &mut self.pixels[(y * self.width + x) as usize];
                pixel[0] = (pixel[0] + wisp[0]).min(1.0);
                pixel[1] = (pixel[1] + wisp[1]).min(1.0);
                pixel[2] = (pixel[2] + wisp[2]).min(1.0);
            }
        }
    }

    /// Convert to RGBA8 bytes suitable for GPU upload.
    pub fn rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            bytes.push((pixel[0].clamp(0.0, 1.0) * 255.0) as u8);
            bytes.push((pixel[1].clamp(0.0, 1.0) * 255.0) as u8);
            bytes.push((pixel[2].clamp(0.0, 1.0) * 255.0) as u8);
            bytes.push((pixel[3].clamp(0.0, 1.0) * 255.0) as u8);
        }
        bytes
    }
}

/// Number of stars baked into the fallback backdrop.
const FALLBACK_STAR_COUNT: u32 = 6000;

/// Generate the complete fallback backdrop: stars plus wisps, as RGBA8.
pub fn backdrop_fallback_rgba8(seed: u64, width: u32, height: u32) -> Vec<u8> {
    let stars = StarfieldGenerator::new(seed, FALLBACK_STAR_COUNT).generate();
    let mut image = BackdropImage::render(&stars, width, height);
    image.apply_wisps(&WispField::new(seed));
    image.rgba8()
}

/// Generate a tinted checkerboard stand-in for a body texture, seeded by the
/// body's name. Returns `size * size` RGBA8 pixels.
pub fn body_fallback_rgba8(name: &str, size: u32) -> Vec<u8> {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    name.hash(&mut hasher);
    let mut rng = ChaCha8Rng::seed_from_u64(hasher.finish());

    // Random hue, fixed saturation and value, so every body gets a
    // distinct but comparable tint.
    let base = hue_to_rgb(rng.random::<f32>());
    let dark = [base[0] * 0.55, base[1] * 0.55, base[2] * 0.55];

    let tile = (size / 8).max(1);
    let mut bytes = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let checker = ((x / tile) + (y / tile)) % 2 == 0;
            let color = if checker { &base } else { &dark };
            bytes.push((color[0] * 255.0) as u8);
            bytes.push((color[1] * 255.0) as u8);
            bytes.push((color[2] * 255.0) as u8);
            bytes.push(255);
        }
    }
    bytes
}

/// Map a hue in [0, 1) to a fully saturated RGB color.
fn hue_to_rgb(hue: f32) -> [f32; 3] {
    let h = hue.rem_euclid(1.0) * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    // Lift toward pastel so textures read well under shading.
    [
        0.35 + r * 0.55,
        0.35 + g * 0.55,
        0.35 + b * 0.55,
    ]
}

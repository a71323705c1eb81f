use image::{
    Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use rayon::prelude::*;

use crate::{
    session::{EraserCursor, ParticleSprite, RenderList},
    types::{CanvasSize, Frame, ParticleShape, Point},
};

const BACKDROP: [u8; 4] = [0, 0, 0, 255];

const PARTICLE_RADIUS: i64 = 3;
const SQUARE_HALF_SIDE: i64 = 3;
const DIAMOND_RADIUS: i64 = 4;
const HEART_SCALE: f32 = 3.0;
const SPRITE_REACH: i64 = 5;

const MAX_STAMP_RADIUS: i64 = 256;
const MAX_RING_REACH: i64 = 4096;

const ERASER_COLOR: [u8; 4] = [255, 0, 0, 255];
const ERASER_OPACITY: f32 = 0.85;
const ERASER_RING_WIDTH: f32 = 3.0;

/// Paints a render list: video, strokes, particles, then the eraser ring.
pub fn rasterize(list: &RenderList) -> RgbaImage {
    let CanvasSize { width, height } = list.canvas;
    let mut image = backdrop(list.video.as_deref(), width, height);

    let buffer: &mut [u8] = &mut image;
    for stroke in list.strokes.iter().filter(|stroke| stroke.is_drawable()) {
        draw_polyline(
            buffer,
            width,
            height,
            &stroke.points,
            stroke.color,
            stroke.size,
        );
    }
    for sprite in &list.particles {
        draw_sprite(buffer, width, height, sprite);
    }
    if let Some(cursor) = &list.eraser {
        draw_eraser_ring(buffer, width, height, cursor);
    }

    image
}

fn backdrop(video: Option<&Frame>, width: u32, height: u32) -> RgbaImage {
    let Some(frame) = video else {
        return RgbaImage::from_pixel(width, height, Rgba(BACKDROP));
    };
    let Some(source) = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone()) else {
        log::warn!(
            "video frame buffer is {} bytes, too small for {}x{}",
            frame.rgba.len(),
            frame.width,
            frame.height
        );
        return RgbaImage::from_pixel(width, height, Rgba(BACKDROP));
    };

    let mut image = if (frame.width, frame.height) == (width, height) {
        source
    } else {
        imageops::resize(&source, width, height, FilterType::Triangle)
    };
    image.par_chunks_exact_mut(4).for_each(|px| px[3] = 255);
    image
}

fn draw_polyline(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    points: &[Point],
    color: [u8; 4],
    size: f32,
) {
    let radius = (size / 2.0).round().clamp(0.0, MAX_STAMP_RADIUS as f32) as i64;
    for pair in points.windows(2) {
        let Some((p0, p1)) = clip_segment(pair[0], pair[1], width, height, radius) else {
            continue;
        };
        draw_segment(buffer, width, height, p0, p1, color, radius);
    }
}

// Liang-Barsky against the canvas grown by the stamp radius. Points are
// returned as whole pixels, so the walk below never leaves that rectangle.
fn clip_segment(
    p0: Point,
    p1: Point,
    width: u32,
    height: u32,
    radius: i64,
) -> Option<((i64, i64), (i64, i64))> {
    if !(p0.x.is_finite() && p0.y.is_finite() && p1.x.is_finite() && p1.y.is_finite()) {
        return None;
    }
    let margin = radius as f64 + 1.0;
    let (min_x, min_y) = (-margin, -margin);
    let (max_x, max_y) = (width as f64 + margin, height as f64 + margin);

    let (x0, y0) = (p0.x as f64, p0.y as f64);
    let (dx, dy) = (p1.x as f64 - x0, p1.y as f64 - y0);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, x0 - min_x),
        (dx, max_x - x0),
        (-dy, y0 - min_y),
        (dy, max_y - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    let pixel = |t: f64| {
        (
            (x0 + t * dx).clamp(min_x, max_x) as i64,
            (y0 + t * dy).clamp(min_y, max_y) as i64,
        )
    };
    Some((pixel(t0), pixel(t1)))
}

// Bresenham walk that stamps a disc at every step, which also rounds the
// joins between segments.
fn draw_segment(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    (mut x0, mut y0): (i64, i64),
    (x1, y1): (i64, i64),
    color: [u8; 4],
    radius: i64,
) {
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        fill_disc(buffer, width, height, (x0, y0), radius, color, 1.0);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// The pixel under `center`, or `None` when nothing within `reach` of it
/// can land on the canvas.
fn visible_center(center: Point, reach: i64, width: u32, height: u32) -> Option<(i64, i64)> {
    if !(center.x.is_finite() && center.y.is_finite()) {
        return None;
    }
    let reach = reach as f32;
    let outside = center.x < -reach
        || center.y < -reach
        || center.x > width as f32 + reach
        || center.y > height as f32 + reach;
    if outside {
        return None;
    }
    Some((center.x as i64, center.y as i64))
}

fn draw_sprite(buffer: &mut [u8], width: u32, height: u32, sprite: &ParticleSprite) {
    let Some((cx, cy)) = visible_center(sprite.position, SPRITE_REACH, width, height) else {
        return;
    };
    let color = sprite.color;
    let alpha = sprite.opacity;

    match sprite.shape {
        ParticleShape::Circle => {
            fill_disc(buffer, width, height, (cx, cy), PARTICLE_RADIUS, color, alpha)
        }
        ParticleShape::Square => {
            for y in cy - SQUARE_HALF_SIDE..cy + SQUARE_HALF_SIDE {
                for x in cx - SQUARE_HALF_SIDE..cx + SQUARE_HALF_SIDE {
                    blend_pixel(buffer, width, height, x, y, color, alpha);
                }
            }
        }
        ParticleShape::Diamond => {
            for dy in -DIAMOND_RADIUS..=DIAMOND_RADIUS {
                for dx in -DIAMOND_RADIUS..=DIAMOND_RADIUS {
                    if dx.abs() + dy.abs() <= DIAMOND_RADIUS {
                        blend_pixel(buffer, width, height, cx + dx, cy + dy, color, alpha);
                    }
                }
            }
        }
        ParticleShape::Heart => {
            let reach = (HEART_SCALE * 1.5).ceil() as i64;
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    if in_heart(dx as f32 / HEART_SCALE, -(dy as f32) / HEART_SCALE) {
                        blend_pixel(buffer, width, height, cx + dx, cy + dy, color, alpha);
                    }
                }
            }
        }
    }
}

// (x² + y² - 1)³ - x²y³ <= 0, with y pointing up.
fn in_heart(x: f32, y: f32) -> bool {
    let a = x * x + y * y - 1.0;
    a * a * a - x * x * y * y * y <= 0.0
}

fn draw_eraser_ring(buffer: &mut [u8], width: u32, height: u32, cursor: &EraserCursor) {
    let half_width = ERASER_RING_WIDTH / 2.0;
    let reach = (cursor.radius + half_width).ceil().clamp(0.0, MAX_RING_REACH as f32) as i64;
    let Some((cx, cy)) = visible_center(cursor.center, reach, width, height) else {
        return;
    };

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let (x, y) = (cx + dx, cy + dy);
            let d = Point::new(x as f32, y as f32).distance(cursor.center);
            if (d - cursor.radius).abs() <= half_width {
                blend_pixel(buffer, width, height, x, y, ERASER_COLOR, ERASER_OPACITY);
            }
        }
    }
}

fn fill_disc(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i64, i64),
    radius: i64,
    color: [u8; 4],
    alpha: f32,
) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                blend_pixel(buffer, width, height, cx + dx, cy + dy, color, alpha);
            }
        }
    }
}

fn blend_pixel(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    x: i64,
    y: i64,
    color: [u8; 4],
    alpha: f32,
) {
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return;
    }
    let idx = ((y as usize) * (width as usize) + x as usize) * 4;
    let Some(px) = buffer.get_mut(idx..idx + 4) else {
        return;
    };

    let a = (alpha * color[3] as f32 / 255.0).clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    if a >= 1.0 {
        px[..3].copy_from_slice(&color[..3]);
        px[3] = 255;
        return;
    }
    for channel in 0..3 {
        let mixed = px[channel] as f32 * (1.0 - a) + color[channel] as f32 * a;
        px[channel] = mixed.round() as u8;
    }
    let dst_alpha = px[3] as f32 / 255.0;
    px[3] = ((a + dst_alpha * (1.0 - a)) * 255.0).round() as u8;
}

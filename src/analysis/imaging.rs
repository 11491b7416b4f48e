// src/analysis/imaging.rs
//! Pixel-level building blocks for the local analysers.
//!
//! Everything here works on `image` buffers or on [`Plane`], a row-major
//! `f32` single-channel raster. Filters use reflect-101 borders, gradients are
//! 3x3 Sobel, and Hough angles are the normal angle of the line in radians,
//! matching the conventions the thresholds upstream were tuned against.

use image::RgbImage;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    fn get_reflected(&self, x: isize, y: isize) -> f32 {
        self.get(reflect101(x, self.width), reflect101(y, self.height))
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[inline]
fn reflect101(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let last = n as isize - 1;
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i > last {
        i = 2 * last - i;
    }
    i.clamp(0, last) as usize
}

/// ITU-R 601 luma, rounded to whole intensities.
pub fn grayscale(img: &RgbImage) -> Plane {
    let (w, h) = img.dimensions();
    let mut plane = Plane::new(w as usize, h as usize);
    for (dst, px) in plane.data.iter_mut().zip(img.pixels()) {
        let [r, g, b] = px.0;
        *dst = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round();
    }
    plane
}

pub fn mean(plane: &Plane) -> f64 {
    if plane.is_empty() {
        return 0.0;
    }
    plane.data.iter().map(|&v| v as f64).sum::<f64>() / plane.data.len() as f64
}

/// Variance of the 4-neighbour Laplacian. High values mean lots of
/// high-frequency energy: fine detail, sharp focus or sensor noise.
pub fn laplacian_variance(plane: &Plane) -> f64 {
    if plane.is_empty() {
        return 0.0;
    }
    let mut responses = Vec::with_capacity(plane.data.len());
    for y in 0..plane.height as isize {
        for x in 0..plane.width as isize {
            let centre = plane.get_reflected(x, y) as f64;
            let around = plane.get_reflected(x - 1, y) as f64
                + plane.get_reflected(x + 1, y) as f64
                + plane.get_reflected(x, y - 1) as f64
                + plane.get_reflected(x, y + 1) as f64;
            responses.push(around - 4.0 * centre);
        }
    }
    let n = responses.len() as f64;
    let avg = responses.iter().sum::<f64>() / n;
    responses.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n
}

/// Separable 5x5 binomial blur (1 4 6 4 1).
pub fn gaussian_blur_5x5(plane: &Plane) -> Plane {
    const KERNEL: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
    let (w, h) = (plane.width, plane.height);

    let mut horizontal = Plane::new(w, h);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let acc: f32 = KERNEL
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * plane.get_reflected(x + k as isize - 2, y))
                .sum();
            horizontal.data[y as usize * w + x as usize] = acc / 16.0;
        }
    }

    let mut out = Plane::new(w, h);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let acc: f32 = KERNEL
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * horizontal.get_reflected(x, y + k as isize - 2))
                .sum();
            out.data[y as usize * w + x as usize] = acc / 16.0;
        }
    }
    out
}

fn sobel(plane: &Plane) -> (Plane, Plane) {
    let (w, h) = (plane.width, plane.height);
    let mut gx = Plane::new(w, h);
    let mut gy = Plane::new(w, h);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let p = |dx: isize, dy: isize| plane.get_reflected(x + dx, y + dy);
            let idx = y as usize * w + x as usize;
            gx.data[idx] = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            gy.data[idx] = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
        }
    }
    (gx, gy)
}

/// Canny edge map: L1 Sobel magnitude, non-maximum suppression along the
/// quantised gradient direction, then hysteresis between `low` and `high`.
pub fn canny(plane: &Plane, low: f32, high: f32) -> Vec<bool> {
    let (w, h) = (plane.width, plane.height);
    let mut edges = vec![false; w * h];
    if w < 3 || h < 3 {
        return edges;
    }

    let (gx, gy) = sobel(plane);
    let magnitude: Vec<f32> = gx
        .data
        .iter()
        .zip(&gy.data)
        .map(|(a, b)| a.abs() + b.abs())
        .collect();

    let mut thin = vec![0.0f32; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let mag = magnitude[idx];
            if mag < low {
                continue;
            }
            let mut angle = (gy.data[idx] as f64).atan2(gx.data[idx] as f64).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            let (dx, dy): (isize, isize) = if !(22.5..157.5).contains(&angle) {
                (1, 0)
            } else if angle < 67.5 {
                (1, 1)
            } else if angle < 112.5 {
                (0, 1)
            } else {
                (-1, 1)
            };
            let ahead = magnitude[(y as isize + dy) as usize * w + (x as isize + dx) as usize];
            let behind = magnitude[(y as isize - dy) as usize * w + (x as isize - dx) as usize];
            if mag > behind && mag >= ahead {
                thin[idx] = mag;
            }
        }
    }

    let mut stack: Vec<usize> = Vec::new();
    for (idx, &mag) in thin.iter().enumerate() {
        if mag >= high {
            edges[idx] = true;
            stack.push(idx);
        }
    }
    while let Some(idx) = stack.pop() {
        let (x, y) = ((idx % w) as isize, (idx / w) as isize);
        for (nx, ny) in neighbours8(x, y, w, h) {
            let n = ny * w + nx;
            if !edges[n] && thin[n] >= low {
                edges[n] = true;
                stack.push(n);
            }
        }
    }
    edges
}

fn neighbours8(x: isize, y: isize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    (-1isize..=1)
        .flat_map(move |dy| (-1isize..=1).map(move |dx| (x + dx, y + dy)))
        .filter(move |&(nx, ny)| {
            (nx, ny) != (x, y) && nx >= 0 && ny >= 0 && nx < w as isize && ny < h as isize
        })
        .map(|(nx, ny)| (nx as usize, ny as usize))
}

/// Centroids of the 8-connected edge components with at least
/// `min_pixels` members.
pub fn edge_centroids(edges: &[bool], width: usize, height: usize, min_pixels: usize) -> Vec<(f64, f64)> {
    let mut seen = vec![false; edges.len()];
    let mut centroids = Vec::new();
    let mut stack = Vec::new();

    for start in 0..edges.len() {
        if !edges[start] || seen[start] {
            continue;
        }
        seen[start] = true;
        stack.push(start);
        let (mut count, mut sum_x, mut sum_y) = (0usize, 0f64, 0f64);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % width, idx / width);
            count += 1;
            sum_x += x as f64;
            sum_y += y as f64;
            for (nx, ny) in neighbours8(x as isize, y as isize, width, height) {
                let n = ny * width + nx;
                if edges[n] && !seen[n] {
                    seen[n] = true;
                    stack.push(n);
                }
            }
        }

        if count >= min_pixels {
            centroids.push((sum_x / count as f64, sum_y / count as f64));
        }
    }
    centroids
}

/// Standard Hough transform at 1 pixel / 1 degree resolution. Returns the
/// normal angle (radians, `[0, PI)`) of every accumulator peak above
/// `threshold` votes.
pub fn hough_line_angles(edges: &[bool], width: usize, height: usize, threshold: u32) -> Vec<f64> {
    const NUM_THETA: usize = 180;
    let max_rho = ((width * width + height * height) as f64).sqrt().ceil() as isize;
    let num_rho = (2 * max_rho + 1) as usize;

    let trig: Vec<(f64, f64)> = (0..NUM_THETA)
        .map(|t| {
            let theta = t as f64 * PI / NUM_THETA as f64;
            (theta.cos(), theta.sin())
        })
        .collect();

    let mut acc = vec![0u32; num_rho * NUM_THETA];
    for (idx, _) in edges.iter().enumerate().filter(|(_, e)| **e) {
        let (x, y) = ((idx % width) as f64, (idx / width) as f64);
        for (t, (cos, sin)) in trig.iter().enumerate() {
            let rho = (x * cos + y * sin).round() as isize + max_rho;
            acc[rho as usize * NUM_THETA + t] += 1;
        }
    }

    let at = |r: isize, t: isize| -> u32 {
        if r < 0 || t < 0 || r >= num_rho as isize || t >= NUM_THETA as isize {
            0
        } else {
            acc[r as usize * NUM_THETA + t as usize]
        }
    };

    let mut angles = Vec::new();
    for r in 0..num_rho as isize {
        for t in 0..NUM_THETA as isize {
            let votes = at(r, t);
            if votes > threshold
                && votes > at(r, t - 1)
                && votes >= at(r, t + 1)
                && votes > at(r - 1, t)
                && votes >= at(r + 1, t)
            {
                angles.push(t as f64 * PI / NUM_THETA as f64);
            }
        }
    }
    angles
}

/// Hue on the 0..180 half-degree scale; `None` for achromatic pixels.
pub fn hue_half_degrees(r: u8, g: u8, b: u8) -> Option<u8> {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta == 0.0 {
        return None;
    }
    let mut hue = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    let half = (hue / 2.0).round() as u16;
    Some((half % 180) as u8)
}

/// CIE L* rescaled to 0..255.
pub fn lightness(r: u8, g: u8, b: u8) -> f64 {
    fn linear(c: u8) -> f64 {
        let c = c as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    let y = 0.212671 * linear(r) + 0.715160 * linear(g) + 0.072169 * linear(b);
    let l = if y > 0.008856 {
        116.0 * y.cbrt() - 16.0
    } else {
        903.3 * y
    };
    (l * 255.0 / 100.0).clamp(0.0, 255.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn plane_from_fn(w: usize, h: usize, f: impl Fn(usize, usize) -> f32) -> Plane {
        let mut plane = Plane::new(w, h);
        for y in 0..h {
            for x in 0..w {
                plane.data[y * w + x] = f(x, y);
            }
        }
        plane
    }

    #[test]
    fn test_reflect101_borders() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(3, 1), 0);
    }

    #[test]
    fn test_grayscale_weights() {
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let gray = grayscale(&img);
        assert_eq!(gray.get(1, 1), 76.0);
        assert!((mean(&gray) - 76.0).abs() < 1e-9);
    }

    #[test]
    fn test_laplacian_variance_flat_vs_checkerboard() {
        let flat = plane_from_fn(16, 16, |_, _| 90.0);
        assert_eq!(laplacian_variance(&flat), 0.0);

        let checker = plane_from_fn(16, 16, |x, y| if (x + y) % 2 == 0 { 0.0 } else { 255.0 });
        assert!(laplacian_variance(&checker) > 1000.0);
    }

    #[test]
    fn test_blur_keeps_constant_plane() {
        let flat = plane_from_fn(9, 7, |_, _| 40.0);
        let blurred = gaussian_blur_5x5(&flat);
        assert!(blurred.data.iter().all(|v| (v - 40.0).abs() < 1e-4));
    }

    #[test]
    fn test_canny_finds_square_outline() {
        let plane = plane_from_fn(40, 40, |x, y| {
            if (10..30).contains(&x) && (10..30).contains(&y) { 255.0 } else { 0.0 }
        });
        let edges = canny(&plane, 100.0, 200.0);
        assert!(edges.iter().any(|e| *e));
        // Interior and far background stay clear.
        assert!(!edges[20 * 40 + 20]);
        assert!(!edges[2 * 40 + 2]);

        let centroids = edge_centroids(&edges, 40, 40, 4);
        assert!(!centroids.is_empty());
        for (cx, cy) in centroids {
            assert!((8.0..=31.0).contains(&cx) && (8.0..=31.0).contains(&cy));
        }
    }

    #[test]
    fn test_hough_detects_horizontal_line() {
        let (w, h) = (200, 50);
        let mut edges = vec![false; w * h];
        for x in 0..w {
            edges[25 * w + x] = true;
        }
        let angles = hough_line_angles(&edges, w, h, 120);
        assert!(!angles.is_empty());
        // A horizontal line has its normal pointing straight down.
        assert!(angles.iter().any(|a| (a - PI / 2.0).abs() < 0.02));
    }

    #[test]
    fn test_hue_and_lightness() {
        assert_eq!(hue_half_degrees(255, 0, 0), Some(0));
        assert_eq!(hue_half_degrees(0, 255, 0), Some(60));
        assert_eq!(hue_half_degrees(0, 0, 255), Some(120));
        assert_eq!(hue_half_degrees(128, 128, 128), None);
        assert_eq!(lightness(0, 0, 0), 0.0);
        assert!((lightness(255, 255, 255) - 255.0).abs() < 0.5);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(0.0), 0.0);
    }
}

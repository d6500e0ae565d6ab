use super::ClassifierOptions;
use crate::error::AppError;
use crate::models::classify_types::{Category, Classifications};
use image::{DynamicImage, RgbImage};
use ndarray::Array4;

const CROP_PCT: f32 = 0.875;

// ImageNet normalization constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Axis-aligned pixel rectangle, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Largest square centred in a `width` x `height` frame.
    pub fn center_square(width: u32, height: u32) -> Self {
        let side = width.min(height);
        Rect::new(
            (width - side) / 2,
            (height - side) / 2,
            (width + side) / 2,
            (height + side) / 2,
        )
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    fn clamp_to(&self, width: u32, height: u32) -> Rect {
        Rect::new(
            self.left.min(width),
            self.top.min(height),
            self.right.min(width),
            self.bottom.min(height),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageProcessingOptions {
    /// Region classified instead of the whole image.
    pub roi: Option<Rect>,
}

/// Engine input built from a decoded bitmap. Always RGB8.
#[derive(Debug, Clone)]
pub struct TensorImage {
    rgb: RgbImage,
}

impl TensorImage {
    pub fn from_bitmap(bitmap: &DynamicImage) -> Self {
        Self {
            rgb: bitmap.to_rgb8(),
        }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.rgb
    }
}

/// Crops to the ROI (if any), resizes the shortest edge to
/// `ceil(crop_size / CROP_PCT)`, centre-crops to `crop_size` and returns a
/// normalised NCHW tensor.
pub fn preprocess_image(
    image: &TensorImage,
    options: &ImageProcessingOptions,
    crop_size: u32,
) -> Result<Array4<f32>, AppError> {
    let mut img = DynamicImage::ImageRgb8(image.as_rgb().clone());

    if let Some(roi) = options.roi {
        let roi = roi.clamp_to(img.width(), img.height());
        if roi.width() == 0 || roi.height() == 0 {
            return Err(AppError::Inference(format!(
                "Region of interest {:?} is empty for a {}x{} image",
                roi,
                img.width(),
                img.height()
            )));
        }
        img = img.crop_imm(roi.left, roi.top, roi.width(), roi.height());
    }

    let resize_size = (crop_size as f32 / CROP_PCT).ceil() as u32;
    let (w, h) = (img.width(), img.height());
    let (new_w, new_h) = if w < h {
        (resize_size, ((h as f32 / w as f32) * resize_size as f32).round() as u32)
    } else {
        (((w as f32 / h as f32) * resize_size as f32).round() as u32, resize_size)
    };
    let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle);

    let crop_x = new_w.saturating_sub(crop_size) / 2;
    let crop_y = new_h.saturating_sub(crop_size) / 2;
    let rgb = resized.crop_imm(crop_x, crop_y, crop_size, crop_size).to_rgb8();

    let hw = (crop_size * crop_size) as usize;
    let mut data = vec![0f32; 3 * hw];
    for (i, pixel) in rgb.pixels().enumerate() {
        for c in 0..3 {
            data[c * hw + i] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Array4::from_shape_vec((1, 3, crop_size as usize, crop_size as usize), data)
        .map_err(|e| AppError::Inference(format!("Failed to create tensor: {}", e)))
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Ranks one output head into categories, honouring the score threshold and
/// `max_results`.
pub fn to_classifications(
    head_index: usize,
    output: &[f32],
    labels: &[String],
    options: &ClassifierOptions,
) -> Classifications {
    let scores = if options.apply_softmax {
        softmax(output)
    } else {
        output.to_vec()
    };

    let mut indexed: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let categories = indexed
        .into_iter()
        .filter(|&(_, score)| options.score_threshold.map_or(true, |t| score >= t))
        .take(options.max_results)
        .map(|(idx, score)| {
            let label = labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", idx));
            Category {
                index: idx,
                ..Category::new(label, score)
            }
        })
        .collect();

    Classifications::new(head_index, categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        ["daisy", "dandelion", "rose", "sunflower", "tulip"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn gradient(width: u32, height: u32) -> TensorImage {
        let img = image::ImageBuffer::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128u8])
        });
        TensorImage::from_bitmap(&DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn test_center_square() {
        assert_eq!(Rect::center_square(640, 480), Rect::new(80, 0, 560, 480));
        assert_eq!(Rect::center_square(300, 500), Rect::new(0, 100, 300, 400));
        assert_eq!(Rect::center_square(64, 64), Rect::new(0, 0, 64, 64));
    }

    #[test]
    fn test_preprocess_shape() {
        let tensor = preprocess_image(&gradient(320, 200), &ImageProcessingOptions::default(), 224)
            .unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        assert!(tensor.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_preprocess_normalizes_channels() {
        let img = image::ImageBuffer::from_pixel(40, 40, image::Rgb([255u8, 0u8, 255u8]));
        let image = TensorImage::from_bitmap(&DynamicImage::ImageRgb8(img));
        let tensor = preprocess_image(&image, &ImageProcessingOptions::default(), 16).unwrap();

        let red = (1.0 - MEAN[0]) / STD[0];
        let green = (0.0 - MEAN[1]) / STD[1];
        assert!((tensor[[0, 0, 5, 5]] - red).abs() < 1e-4);
        assert!((tensor[[0, 1, 5, 5]] - green).abs() < 1e-4);
    }

    #[test]
    fn test_roi_selects_region() {
        // Left half black, right half white.
        let img = image::ImageBuffer::from_fn(64, 32, |x, _| {
            if x < 32 {
                image::Rgb([0u8, 0, 0])
            } else {
                image::Rgb([255u8, 255, 255])
            }
        });
        let image = TensorImage::from_bitmap(&DynamicImage::ImageRgb8(img));
        let options = ImageProcessingOptions {
            roi: Some(Rect::new(32, 0, 64, 32)),
        };
        let tensor = preprocess_image(&image, &options, 8).unwrap();

        let white = (1.0 - MEAN[0]) / STD[0];
        assert!(tensor.index_axis(ndarray::Axis(1), 0).iter().all(|v| (v - white).abs() < 1e-3));
    }

    #[test]
    fn test_empty_roi_rejected() {
        let options = ImageProcessingOptions {
            roi: Some(Rect::new(100, 100, 120, 120)),
        };
        assert!(preprocess_image(&gradient(50, 50), &options, 8).is_err());
    }

    #[test]
    fn test_softmax_ranking() {
        let options = ClassifierOptions::default();
        let result = to_classifications(0, &[0.5, 3.0, -1.0, 1.0, 0.0], &labels(), &options);

        assert_eq!(result.categories.len(), 5);
        assert_eq!(result.categories[0].label, "dandelion");
        assert_eq!(result.categories[0].index, 1);
        assert!(result
            .categories
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
        let total: f32 = result.categories.iter().map(|c| c.score).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_max_results_truncates() {
        let options = ClassifierOptions::default().with_max_results(1);
        let result = to_classifications(0, &[0.1, 0.2, 0.9], &labels(), &options);
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.top().unwrap().label, "rose");
    }

    #[test]
    fn test_threshold_and_raw_scores() {
        let options = ClassifierOptions {
            apply_softmax: false,
            score_threshold: Some(0.3),
            ..ClassifierOptions::default()
        };
        let result = to_classifications(0, &[0.1, 0.35, 0.55], &labels(), &options);
        let scores: Vec<f32> = result.categories.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![0.55, 0.35]);
    }

    #[test]
    fn test_unknown_index_gets_placeholder_label() {
        let options = ClassifierOptions {
            apply_softmax: false,
            ..ClassifierOptions::default()
        };
        let result = to_classifications(0, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.9], &labels(), &options);
        assert_eq!(result.top().unwrap().label, "class_5");
    }
}

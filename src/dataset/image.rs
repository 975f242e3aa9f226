//! Single-channel image samples and their upload to Burn tensors

use burn::prelude::*;
use burn::tensor::TensorData;
use serde::{Deserialize, Serialize};

use crate::utils::error::{ClassifierError, Result};

/// A single-channel image stored row-major (`height * width` pixels)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub height: usize,
    pub width: usize,
    pub pixels: Vec<f32>,
}

impl Image {
    /// Create an image, checking the pixel count against the dimensions
    pub fn new(height: usize, width: usize, pixels: Vec<f32>) -> Result<Self> {
        if pixels.len() != height * width {
            return Err(ClassifierError::ShapeMismatch(format!(
                "image of {}x{} needs {} pixels, got {}",
                height,
                width,
                height * width,
                pixels.len()
            )));
        }
        Ok(Self {
            height,
            width,
            pixels,
        })
    }

    /// An all-zero image
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            pixels: vec![0.0; height * width],
        }
    }
}

/// One-hot encode `label` into a vector of length `num_classes`
pub fn one_hot(label: usize, num_classes: usize) -> Result<Vec<f32>> {
    if label >= num_classes {
        return Err(ClassifierError::ShapeMismatch(format!(
            "label {} out of range for {} classes",
            label, num_classes
        )));
    }
    let mut encoded = vec![0.0; num_classes];
    encoded[label] = 1.0;
    Ok(encoded)
}

/// Upload a batch of images as a `[batch, 1, height, width]` tensor
///
/// Every image must have exactly the expected dimensions.
pub fn images_to_tensor<B: Backend>(
    images: &[Image],
    height: usize,
    width: usize,
    device: &B::Device,
) -> Result<Tensor<B, 4>> {
    let mut data = Vec::with_capacity(images.len() * height * width);

    for (i, image) in images.iter().enumerate() {
        if image.height != height || image.width != width {
            return Err(ClassifierError::ShapeMismatch(format!(
                "image {} is {}x{}, model expects {}x{}",
                i, image.height, image.width, height, width
            )));
        }
        if image.pixels.len() != height * width {
            return Err(ClassifierError::ShapeMismatch(format!(
                "image {} has {} pixels, expected {}",
                i,
                image.pixels.len(),
                height * width
            )));
        }
        data.extend_from_slice(&image.pixels);
    }

    let shape = [images.len(), 1, height, width];
    Ok(Tensor::from_data(TensorData::new(data, shape), device))
}

/// Upload a batch of one-hot labels as a `[batch, num_classes]` tensor
pub fn labels_to_tensor<B: Backend>(
    labels: &[Vec<f32>],
    num_classes: usize,
    device: &B::Device,
) -> Result<Tensor<B, 2>> {
    let mut data = Vec::with_capacity(labels.len() * num_classes);

    for (i, label) in labels.iter().enumerate() {
        if label.len() != num_classes {
            return Err(ClassifierError::ShapeMismatch(format!(
                "label {} has length {}, expected {}",
                i,
                label.len(),
                num_classes
            )));
        }
        data.extend_from_slice(label);
    }

    let shape = [labels.len(), num_classes];
    Ok(Tensor::from_data(TensorData::new(data, shape), device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_image_new_checks_pixel_count() {
        assert!(Image::new(2, 3, vec![0.0; 6]).is_ok());
        assert!(matches!(
            Image::new(2, 3, vec![0.0; 5]),
            Err(ClassifierError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(one_hot(1, 3).unwrap(), vec![0.0, 1.0, 0.0]);
        assert!(one_hot(3, 3).is_err());
    }

    #[test]
    fn test_images_to_tensor_shape() {
        let device = Default::default();
        let images = vec![Image::zeros(4, 5), Image::zeros(4, 5), Image::zeros(4, 5)];
        let tensor = images_to_tensor::<TestBackend>(&images, 4, 5, &device).unwrap();
        assert_eq!(tensor.dims(), [3, 1, 4, 5]);
    }

    #[test]
    fn test_images_to_tensor_rejects_wrong_dims() {
        let device = Default::default();
        let images = vec![Image::zeros(4, 4), Image::zeros(4, 5)];
        let result = images_to_tensor::<TestBackend>(&images, 4, 4, &device);
        assert!(matches!(result, Err(ClassifierError::ShapeMismatch(_))));
    }

    #[test]
    fn test_labels_to_tensor() {
        let device = Default::default();
        let labels = vec![one_hot(0, 2).unwrap(), one_hot(1, 2).unwrap()];
        let tensor = labels_to_tensor::<TestBackend>(&labels, 2, &device).unwrap();
        assert_eq!(tensor.dims(), [2, 2]);

        let bad = vec![vec![1.0, 0.0, 0.0]];
        assert!(labels_to_tensor::<TestBackend>(&bad, 2, &device).is_err());
    }
}

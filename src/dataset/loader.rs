//! Dataset files
//!
//! A dataset file is JSON with the image geometry, the number of classes and
//! a list of samples carrying raw pixels and an integer class label:
//!
//! ```json
//! { "img_h": 8, "img_w": 8, "n_out": 2,
//!   "samples": [ { "pixels": [0.0, ...], "label": 1 } ] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::image::{one_hot, Image};
use crate::utils::error::{ClassifierError, Result, ResultExt};

/// A raw sample as stored on disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleRecord {
    pub pixels: Vec<f32>,
    pub label: usize,
}

/// On-disk dataset representation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetFile {
    pub img_h: usize,
    pub img_w: usize,
    pub n_out: usize,
    pub samples: Vec<SampleRecord>,
}

/// In-memory dataset ready for training: images plus one-hot labels
#[derive(Clone, Debug)]
pub struct Dataset {
    pub img_h: usize,
    pub img_w: usize,
    pub n_out: usize,
    pub images: Vec<Image>,
    pub labels: Vec<Vec<f32>>,
}

impl Dataset {
    /// Build a dataset from images and integer class labels
    pub fn from_class_labels(
        img_h: usize,
        img_w: usize,
        n_out: usize,
        images: Vec<Image>,
        classes: &[usize],
    ) -> Result<Self> {
        if images.len() != classes.len() {
            return Err(ClassifierError::ShapeMismatch(format!(
                "{} images but {} labels",
                images.len(),
                classes.len()
            )));
        }

        let labels = classes
            .iter()
            .map(|&c| one_hot(c, n_out))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            img_h,
            img_w,
            n_out,
            images,
            labels,
        })
    }

    /// Load and validate a JSON dataset file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        let file: DatasetFile = serde_json::from_str(&content)?;
        let dataset = Self::try_from(file)?;

        info!(
            "Loaded {} samples ({}x{}, {} classes) from {}",
            dataset.len(),
            dataset.img_h,
            dataset.img_w,
            dataset.n_out,
            path.display()
        );

        Ok(dataset)
    }

    /// Write the dataset back to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = self.to_file();
        let json = serde_json::to_string(&file)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Convert to the on-disk representation
    pub fn to_file(&self) -> DatasetFile {
        let samples = self
            .images
            .iter()
            .zip(self.classes())
            .map(|(image, label)| SampleRecord {
                pixels: image.pixels.clone(),
                label,
            })
            .collect();

        DatasetFile {
            img_h: self.img_h,
            img_w: self.img_w,
            n_out: self.n_out,
            samples,
        }
    }

    /// Integer class of every sample
    pub fn classes(&self) -> Vec<usize> {
        self.labels
            .iter()
            .map(|l| crate::utils::metrics::argmax(l).unwrap_or(0))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl TryFrom<DatasetFile> for Dataset {
    type Error = ClassifierError;

    fn try_from(file: DatasetFile) -> Result<Self> {
        if file.img_h == 0 || file.img_w == 0 || file.n_out == 0 {
            return Err(ClassifierError::Dataset(
                "img_h, img_w and n_out must all be positive".to_string(),
            ));
        }

        let mut images = Vec::with_capacity(file.samples.len());
        let mut classes = Vec::with_capacity(file.samples.len());

        for (i, sample) in file.samples.into_iter().enumerate() {
            let image = Image::new(file.img_h, file.img_w, sample.pixels).map_err(|e| {
                ClassifierError::Dataset(format!("sample {}: {}", i, e))
            })?;
            if sample.label >= file.n_out {
                return Err(ClassifierError::Dataset(format!(
                    "sample {}: label {} out of range for {} classes",
                    i, sample.label, file.n_out
                )));
            }
            images.push(image);
            classes.push(sample.label);
        }

        Self::from_class_labels(file.img_h, file.img_w, file.n_out, images, &classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_file() -> DatasetFile {
        DatasetFile {
            img_h: 2,
            img_w: 2,
            n_out: 3,
            samples: vec![
                SampleRecord {
                    pixels: vec![0.0, 0.1, 0.2, 0.3],
                    label: 2,
                },
                SampleRecord {
                    pixels: vec![1.0, 1.0, 1.0, 1.0],
                    label: 0,
                },
            ],
        }
    }

    #[test]
    fn test_try_from_file() {
        let dataset = Dataset::try_from(tiny_file()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels[0], vec![0.0, 0.0, 1.0]);
        assert_eq!(dataset.classes(), vec![2, 0]);
    }

    #[test]
    fn test_rejects_bad_pixel_count() {
        let mut file = tiny_file();
        file.samples[1].pixels.pop();
        assert!(matches!(
            Dataset::try_from(file),
            Err(ClassifierError::Dataset(_))
        ));
    }

    #[test]
    fn test_rejects_label_out_of_range() {
        let mut file = tiny_file();
        file.samples[0].label = 3;
        assert!(Dataset::try_from(file).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let dataset = Dataset::try_from(tiny_file()).unwrap();
        dataset.save(&path).unwrap();

        let loaded = Dataset::load(&path).unwrap();
        assert_eq!(loaded.images, dataset.images);
        assert_eq!(loaded.labels, dataset.labels);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Dataset::load(Path::new("/nonexistent/data.json"));
        assert!(matches!(result, Err(ClassifierError::Dataset(_))));
    }
}

use std::path::{Path, PathBuf};

use crate::{
    device::Device,
    errors::{RmbgError, Result},
    traits::SegmentationModel,
};
use hf_hub::api::sync::ApiBuilder;
use image::{imageops, imageops::FilterType, GrayImage, ImageBuffer, RgbImage};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use parking_lot::Mutex;

pub const DEFAULT_MODEL_REPO: &str = "briaai/RMBG-2.0";
pub const DEFAULT_MODEL_FILE: &str = "onnx/model.onnx";

/// Working resolution of RMBG-2.0.
pub const IMAGE_SIZE: u32 = 1024;

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resolves `file` from the model hub, downloading it on first use.
///
/// The hub keeps its own cache, so later runs get the cached path back without
/// touching the network. Failures are not retried.
pub fn fetch_model(repo: &str, file: &str, token: Option<String>) -> Result<PathBuf> {
    let hub_error = |source| RmbgError::Hub {
        repo: repo.to_string(),
        file: file.to_string(),
        source,
    };

    let mut builder = ApiBuilder::new().with_progress(true);
    if let Some(token) = token {
        builder = builder.with_token(Some(token));
    }
    let api = builder.build().map_err(hub_error)?;

    tracing::debug!("resolving {file} from {repo}");
    api.model(repo.to_string()).get(file).map_err(hub_error)
}

/// Loaded segmentation model bound to one device.
///
/// Built once per run and handed to every caller by reference.
pub struct Model {
    device: Device,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl Model {
    pub fn new(model_path: &Path, device: Device, device_id: i32) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| ort_failure("session builder initialization", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ort_failure("graph optimization setup", e))?
            .with_execution_providers(device.execution_providers(device_id))
            .map_err(|e| ort_failure("execution provider setup", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                ort_failure(format!("model file load: {}", model_path.display()), e)
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| RmbgError::Validation {
                field: "model inputs".to_string(),
                reason: "are empty".to_string(),
            })?;
        // The network emits several side outputs; the final one is the refined map.
        let output_name = session
            .outputs
            .last()
            .map(|output| output.name.clone())
            .ok_or_else(|| RmbgError::Validation {
                field: "model outputs".to_string(),
                reason: "are empty".to_string(),
            })?;

        tracing::debug!(
            "model {} loaded on {device} (input `{input_name}`, output `{output_name}`)",
            model_path.display()
        );

        Ok(Self {
            device,
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }

    pub const fn device(&self) -> Device {
        self.device
    }
}

impl SegmentationModel for Model {
    fn image_size(&self) -> u32 {
        IMAGE_SIZE
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![
                self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?
            ])
            .map_err(|e| ort_failure("inference", e))?;
        let prediction = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned();
        Ok(prediction)
    }
}

fn ort_failure(operation: impl Into<String>, err: impl std::fmt::Display) -> RmbgError {
    RmbgError::Model {
        operation: operation.into(),
        source: err.to_string().into(),
    }
}

/// Bicubic resize to `image_size` squared (aspect ratio is not kept), then ImageNet
/// normalization into a `1x3xSxS` tensor.
pub fn preprocess(image: &RgbImage, image_size: u32) -> Array4<f32> {
    let resized = imageops::resize(image, image_size, image_size, FilterType::CatmullRom);
    let mut tensor = resized.as_ndarray3().mapv(|v| f32::from(v) / 255.0);
    for ((mut channel, mean), std) in tensor.outer_iter_mut().zip(MEAN).zip(STD) {
        channel.mapv_inplace(|v| (v - mean) / std);
    }
    tensor.insert_axis(Axis(0))
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Turns the raw logit map into an 8-bit alpha mask at `width` x `height`.
///
/// The resize here undoes the square distortion introduced by [`preprocess`].
pub fn decode_mask(prediction: ArrayView4<f32>, width: u32, height: u32) -> Result<GrayImage> {
    let (batch, channels, rows, cols) = prediction.dim();
    if batch == 0 || channels == 0 || rows == 0 || cols == 0 {
        return Err(RmbgError::Validation {
            field: "prediction shape".to_string(),
            reason: format!("{:?} has an empty dimension", prediction.shape()),
        });
    }

    let pixels = prediction
        .slice(s![0, 0, .., ..])
        .iter()
        .map(|&logit| (sigmoid(logit) * 255.0) as u8)
        .collect::<Vec<u8>>();
    let mask: GrayImage = ImageBuffer::from_raw(cols as u32, rows as u32, pixels).ok_or_else(
        || RmbgError::Validation {
            field: "prediction map".to_string(),
            reason: "does not fit its own dimensions".to_string(),
        },
    )?;

    Ok(imageops::resize(&mask, width, height, FilterType::CatmullRom))
}

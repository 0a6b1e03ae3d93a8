use std::fmt;

use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, CoreMLExecutionProvider, ExecutionProvider,
    ExecutionProviderDispatch,
};

/// Compute backend the model session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// NVIDIA GPU through CUDA. Preferred whenever it is present.
    Cuda,
    /// Apple Neural Engine / GPU through CoreML.
    CoreMl,
    Cpu,
}

impl Device {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::CoreMl => "coreml",
            Self::Cpu => "cpu",
        }
    }

    /// Execution providers registered on the session, in the order ort should try them.
    ///
    /// TF32 matrix multiplies are only switched on for CUDA. Every list ends with the
    /// CPU provider so operators the accelerator lacks still run.
    pub fn execution_providers(self, device_id: i32) -> Vec<ExecutionProviderDispatch> {
        let mut providers = match self {
            Self::Cuda => vec![CUDAExecutionProvider::default()
                .with_device_id(device_id)
                .with_tf32(true)
                .build()],
            Self::CoreMl => vec![CoreMLExecutionProvider::default().build()],
            Self::Cpu => Vec::new(),
        };
        providers.push(CPUExecutionProvider::default().build());
        providers
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the best available backend: CUDA, then CoreML, then CPU.
pub fn select_device() -> Device {
    select_with(
        provider_available(Device::Cuda, &CUDAExecutionProvider::default()),
        provider_available(Device::CoreMl, &CoreMLExecutionProvider::default()),
    )
}

const fn select_with(cuda: bool, coreml: bool) -> Device {
    if cuda {
        Device::Cuda
    } else if coreml {
        Device::CoreMl
    } else {
        Device::Cpu
    }
}

fn provider_available(device: Device, provider: &impl ExecutionProvider) -> bool {
    match provider.is_available() {
        Ok(available) => available,
        Err(e) => {
            tracing::debug!("{device} availability query failed: {e}");
            false
        }
    }
}

//! U-Net Architecture
//!
//! Encoder/decoder segmentation network with skip connections. The depth
//! (`num_layers`), initial width (`features_start`) and the upsampling mode
//! (`bilinear`) are configurable; the output is a per-pixel score map with
//! one channel per training class.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
    },
    tensor::{
        backend::Backend,
        module::interpolate,
        ops::{InterpolateMode, InterpolateOptions},
        Tensor,
    },
};

/// Configuration for the U-Net model
#[derive(Config, Debug)]
pub struct UNetConfig {
    /// Number of output classes
    #[config(default = "19")]
    pub num_classes: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Number of encoder levels
    #[config(default = "5")]
    pub num_layers: usize,

    /// Feature channels at the first level; doubled at each deeper level
    #[config(default = "64")]
    pub features_start: usize,

    /// Use bilinear upsampling instead of transposed convolutions
    #[config(default = "false")]
    pub bilinear: bool,
}

impl UNetConfig {
    /// Initialize the model on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> UNet<B> {
        let mut feats = self.features_start;

        let input = DoubleConv::new(self.in_channels, feats, device);

        let mut downs = Vec::with_capacity(self.num_layers - 1);
        for _ in 0..self.num_layers - 1 {
            downs.push(Down::new(feats, feats * 2, device));
            feats *= 2;
        }

        let mut ups = Vec::with_capacity(self.num_layers - 1);
        for _ in 0..self.num_layers - 1 {
            ups.push(Up::new(feats, feats / 2, self.bilinear, device));
            feats /= 2;
        }

        let head = Conv2dConfig::new([feats, self.num_classes], [1, 1]).init(device);

        UNet {
            input,
            downs,
            ups,
            head,
            num_classes: self.num_classes,
        }
    }
}

/// Two stacked conv3x3 + BatchNorm + ReLU stages
#[derive(Module, Debug)]
pub struct DoubleConv<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
}

impl<B: Backend> DoubleConv<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let bn1 = BatchNormConfig::new(out_channels).init(device);
        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let bn2 = BatchNormConfig::new(out_channels).init(device);

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv1.forward(x);
        let x = self.bn1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);
        Relu::new().forward(x)
    }
}

/// Downscaling stage: 2x2 max pool followed by a DoubleConv
#[derive(Module, Debug)]
pub struct Down<B: Backend> {
    pool: MaxPool2d,
    conv: DoubleConv<B>,
}

impl<B: Backend> Down<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            conv: DoubleConv::new(in_channels, out_channels, device),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.conv.forward(self.pool.forward(x))
    }
}

/// Upsampling mode for the decoder path
#[derive(Module, Debug)]
pub enum Upsample<B: Backend> {
    /// Learned 2x2 stride-2 transposed convolution
    Transpose(ConvTranspose2d<B>),
    /// Fixed bilinear interpolation followed by a channel-reducing 1x1 conv
    Bilinear(Conv2d<B>),
}

/// Upscaling stage: upsample, pad to the skip's size, concat, DoubleConv
#[derive(Module, Debug)]
pub struct Up<B: Backend> {
    upsample: Upsample<B>,
    conv: DoubleConv<B>,
}

impl<B: Backend> Up<B> {
    fn new(in_channels: usize, out_channels: usize, bilinear: bool, device: &B::Device) -> Self {
        let upsample = if bilinear {
            Upsample::Bilinear(
                Conv2dConfig::new([in_channels, in_channels / 2], [1, 1]).init(device),
            )
        } else {
            Upsample::Transpose(
                ConvTranspose2dConfig::new([in_channels, in_channels / 2], [2, 2])
                    .with_stride([2, 2])
                    .init(device),
            )
        };

        Self {
            upsample,
            conv: DoubleConv::new(in_channels, out_channels, device),
        }
    }

    fn forward(&self, x: Tensor<B, 4>, skip: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = match &self.upsample {
            Upsample::Transpose(t) => t.forward(x),
            Upsample::Bilinear(reduce) => {
                let [_, _, h, w] = x.dims();
                let x = interpolate(
                    x,
                    [h * 2, w * 2],
                    InterpolateOptions::new(InterpolateMode::Bilinear),
                );
                reduce.forward(x)
            }
        };

        // Odd encoder sizes floor on pooling, so the upsampled map can be
        // one pixel short of the skip in either dimension.
        let [_, _, h1, w1] = x.dims();
        let [_, _, h2, w2] = skip.dims();
        let (dh, dw) = (h2 - h1, w2 - w1);
        let x = if dh > 0 || dw > 0 {
            x.pad((dw / 2, dw - dw / 2, dh / 2, dh - dh / 2), 0.0)
        } else {
            x
        };

        self.conv.forward(Tensor::cat(vec![skip, x], 1))
    }
}

/// U-Net segmentation network
#[derive(Module, Debug)]
pub struct UNet<B: Backend> {
    input: DoubleConv<B>,
    downs: Vec<Down<B>>,
    ups: Vec<Up<B>>,
    head: Conv2d<B>,
    num_classes: usize,
}

impl<B: Backend> UNet<B> {
    /// Forward pass.
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape `[batch_size, 3, height, width]`
    ///
    /// # Returns
    /// * Per-pixel logits of shape `[batch_size, num_classes, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.input.forward(x);

        let mut skips = Vec::with_capacity(self.downs.len());
        for down in &self.downs {
            skips.push(x.clone());
            x = down.forward(x);
        }

        for (up, skip) in self.ups.iter().zip(skips.into_iter().rev()) {
            x = up.forward(x, skip);
        }

        self.head.forward(x)
    }

    /// Number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_unet_output_shape() {
        let device = Default::default();
        let config = UNetConfig::new()
            .with_num_layers(3)
            .with_features_start(8);
        let model = config.init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 19, 32, 64]);
    }

    #[test]
    fn test_unet_handles_odd_spatial_sizes() {
        let device = Default::default();
        let config = UNetConfig::new()
            .with_num_layers(3)
            .with_features_start(8);
        let model = config.init::<TestBackend>(&device);

        // 30 and 46 both floor through two pooling stages.
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 30, 46], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [1, 19, 30, 46]);
    }

    #[test]
    fn test_unet_bilinear_output_shape() {
        let device = Default::default();
        let config = UNetConfig::new()
            .with_num_layers(3)
            .with_features_start(8)
            .with_bilinear(true);
        let model = config.init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [1, 19, 32, 32]);
    }
}

use image::imageops::FilterType;

/// Side length the fire image classifier was trained on
pub const MODEL_INPUT_SIZE: u32 = 150;

/// RGB image as row-major `[height][width][channel]` values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ImageTensor {
    pub const CHANNELS: usize = 3;

    /// Decode a PNG/JPEG payload, resize it to the model input and scale to `[0, 1]`
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?.to_rgb8();
        let resized = image::imageops::resize(&decoded, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::CatmullRom);

        Ok(Self {
            width: resized.width() as usize,
            height: resized.height() as usize,
            data: resized.as_raw().iter().map(|&v| v as f32 / 255.0).collect(),
        })
    }

    /// Uniform tensor, mostly useful for tests and benches
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height * Self::CHANNELS],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Per-channel mean over `pool`×`pool` windows, keeping HWC order
    ///
    /// Trailing rows/columns that do not fill a window are averaged over
    /// whatever pixels they do cover.
    pub fn average_pool(&self, pool: usize) -> Vec<f32> {
        let pool = pool.max(1);
        let out_w = self.width.div_ceil(pool);
        let out_h = self.height.div_ceil(pool);
        let mut out = Vec::with_capacity(out_w * out_h * Self::CHANNELS);

        for by in 0..out_h {
            for bx in 0..out_w {
                let mut sums = [0f32; Self::CHANNELS];
                let mut count = 0usize;
                for y in (by * pool)..((by + 1) * pool).min(self.height) {
                    for x in (bx * pool)..((bx + 1) * pool).min(self.width) {
                        let base = (y * self.width + x) * Self::CHANNELS;
                        for (c, sum) in sums.iter_mut().enumerate() {
                            *sum += self.data[base + c];
                        }
                        count += 1;
                    }
                }
                out.extend(sums.iter().map(|s| s / count as f32));
            }
        }
        out
    }
}

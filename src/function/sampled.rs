use bitvec::{field::BitField, prelude::Msb0, slice::BitSlice};

use crate::error::{EvalError, EvalResult};

use super::{interpolate, FunctionDict};

/// Type 0 functions use a sequence of sample values (contained in a stream) to provide an
/// approximation for functions whose domains and ranges are bounded. The samples are organized
/// as an m-dimensional table in which each entry has n components.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFunction {
    /// An array of m positive integers that shall specify the number of samples in each
    /// input dimension of the sample table
    size: Vec<u32>,

    /// The number of bits that shall represent each sample. (If the function has multiple
    /// output values, each one shall occupy BitsPerSample bits.)
    bits_per_sample: BitsPerSample,

    /// An array of 2 * m numbers specifying the linear mapping of input values into the domain
    /// of the function's sample table.
    ///
    /// Default value: [0 (Size0 - 1) 0 (Size1 - 1) ...]
    encode: Vec<f32>,

    /// An array of 2 * n numbers specifying the linear mapping of sample values into the range
    /// appropriate for the function's output values
    ///
    /// Default value: same as the value of Range
    decode: Vec<f32>,

    /// The unpacked sample table. The first dimension varies fastest, and each
    /// entry holds n consecutive samples
    samples: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InterpolationOrder {
    #[default]
    Linear = 1,
    Cubic = 3,
}

impl InterpolationOrder {
    fn from_integer(order: u32) -> EvalResult<Self> {
        Ok(match order {
            1 => Self::Linear,
            3 => Self::Cubic,
            _ => {
                return Err(EvalError::malformed(format!(
                    "Order must be 1 or 3, found {}",
                    order
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitsPerSample {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Twelve = 12,
    Sixteen = 16,
    TwentyFour = 24,
    ThirtyTwo = 32,
}

impl BitsPerSample {
    fn from_integer(bits: u32) -> EvalResult<Self> {
        Ok(match bits {
            1 => Self::One,
            2 => Self::Two,
            4 => Self::Four,
            8 => Self::Eight,
            12 => Self::Twelve,
            16 => Self::Sixteen,
            24 => Self::TwentyFour,
            32 => Self::ThirtyTwo,
            _ => {
                return Err(EvalError::malformed(format!(
                    "unsupported BitsPerSample {}",
                    bits
                )))
            }
        })
    }

    fn bits(self) -> usize {
        self as usize
    }

    /// The largest representable sample, `2^BitsPerSample - 1`
    fn max_value(self) -> f32 {
        ((1u64 << self.bits()) - 1) as f32
    }
}

impl SampledFunction {
    pub fn from_dict(dict: &FunctionDict, domain: &[f32], range: Option<&[f32]>) -> EvalResult<Self> {
        let range = range.ok_or(EvalError::MissingRequiredKey { key: "Range" })?;

        let size = dict
            .size
            .clone()
            .ok_or(EvalError::MissingRequiredKey { key: "Size" })?;

        let bits_per_sample = BitsPerSample::from_integer(
            dict.bits_per_sample
                .ok_or(EvalError::MissingRequiredKey {
                    key: "BitsPerSample",
                })?,
        )?;

        // The order of interpolation between samples. Valid values shall be 1 and 3,
        // specifying linear and cubic spline interpolation, respectively
        let order = dict
            .order
            .map(InterpolationOrder::from_integer)
            .transpose()?
            .unwrap_or_default();

        let data = dict
            .samples
            .as_ref()
            .ok_or(EvalError::MissingRequiredKey { key: "Samples" })?;

        let m = domain.len() / 2;
        let n = range.len() / 2;

        if size.len() != m {
            return Err(EvalError::malformed(format!(
                "Size has {} entries for {} inputs",
                size.len(),
                m
            )));
        }

        if size.contains(&0) {
            return Err(EvalError::malformed("Size entries must be positive"));
        }

        let encode = dict
            .encode
            .clone()
            .unwrap_or_else(|| size.iter().flat_map(|&i| [0.0, i as f32 - 1.0]).collect());

        if encode.len() != 2 * m {
            return Err(EvalError::malformed(format!(
                "Encode has {} values for {} inputs",
                encode.len(),
                m
            )));
        }

        let decode = dict.decode.clone().unwrap_or_else(|| range.to_vec());

        if decode.len() != 2 * n {
            return Err(EvalError::malformed(format!(
                "Decode has {} values for {} outputs",
                decode.len(),
                n
            )));
        }

        let sample_count = size
            .iter()
            .try_fold(n, |acc, &s| acc.checked_mul(s as usize))
            .ok_or_else(|| EvalError::malformed("sample table is too large"))?;

        let bits = bits_per_sample.bits();

        let available = data.len().saturating_mul(8) / bits;
        if available < sample_count {
            return Err(EvalError::malformed(format!(
                "sample data holds {} samples, but {} are required",
                available, sample_count
            )));
        }

        let samples = BitSlice::<u8, Msb0>::from_slice(data)
            .chunks_exact(bits)
            .take(sample_count)
            .map(|chunk| chunk.load_be::<u32>())
            .collect::<Vec<u32>>();

        if order == InterpolationOrder::Cubic {
            log::warn!("cubic spline sampled function will be interpolated linearly");
        }

        Ok(Self {
            size,
            bits_per_sample,
            encode,
            decode,
            samples,
        })
    }

    pub fn output_count(&self) -> usize {
        self.decode.len() / 2
    }

    /// Multilinear interpolation between the sample table entries surrounding
    /// the encoded input. `inputs` have already been clipped to `domain`
    pub fn evaluate(&self, inputs: &[f32], domain: &[f32]) -> Vec<f32> {
        let n = self.output_count();

        // per input dimension: lower grid index, upper grid index, weight of the upper
        let mut cells = Vec::with_capacity(inputs.len());
        for (i, &x) in inputs.iter().enumerate() {
            let max_index = self.size[i] - 1;

            let e = interpolate(
                x,
                domain[2 * i],
                domain[2 * i + 1],
                self.encode[2 * i],
                self.encode[2 * i + 1],
            )
            .max(0.0)
            .min(max_index as f32);

            let lower = (e.floor() as u32).min(max_index);
            let upper = (lower + 1).min(max_index);

            cells.push((lower, upper, e - lower as f32));
        }

        // dimensions with no fractional part contribute a single corner
        let interpolated_dims = cells
            .iter()
            .enumerate()
            .filter(|(_, (lower, upper, t))| lower != upper && *t > 0.0)
            .map(|(i, _)| i)
            .collect::<Vec<usize>>();

        let mut outputs = vec![0.0f32; n];

        for corner in 0..(1usize << interpolated_dims.len()) {
            let mut weight = 1.0;
            let mut entry = 0;
            let mut stride = 1;

            for (i, &(lower, upper, t)) in cells.iter().enumerate() {
                let index = match interpolated_dims.iter().position(|&d| d == i) {
                    Some(bit) if corner & (1 << bit) != 0 => {
                        weight *= t;
                        upper
                    }
                    Some(..) => {
                        weight *= 1.0 - t;
                        lower
                    }
                    None => lower,
                };

                entry += index as usize * stride;
                stride *= self.size[i] as usize;
            }

            for (j, output) in outputs.iter_mut().enumerate() {
                *output += weight * self.samples[entry * n + j] as f32;
            }
        }

        let max_value = self.bits_per_sample.max_value();

        outputs
            .iter()
            .enumerate()
            .map(|(j, &sample)| {
                interpolate(sample, 0.0, max_value, self.decode[2 * j], self.decode[2 * j + 1])
            })
            .collect()
    }
}

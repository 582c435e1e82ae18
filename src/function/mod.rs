use crate::error::{EvalError, EvalResult};

use self::{
    exponential_interpolation::ExponentialInterpolationFunction, sampled::SampledFunction,
    stitching::StitchingFunction,
};

mod exponential_interpolation;
mod sampled;
mod stitching;

/// The entries of a function dictionary (or stream dictionary), with indirect
/// references already resolved by the caller
///
/// Only the entries relevant to the dictionary's `FunctionType` are read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionDict {
    pub function_type: Option<i32>,
    pub domain: Option<Vec<f32>>,
    pub range: Option<Vec<f32>>,

    /// Type 2
    pub c0: Option<Vec<f32>>,
    pub c1: Option<Vec<f32>>,
    pub n: Option<f32>,

    /// Type 3
    pub functions: Option<Vec<FunctionDict>>,
    pub bounds: Option<Vec<f32>>,

    /// Type 0 and type 3
    pub encode: Option<Vec<f32>>,

    /// Type 0
    pub size: Option<Vec<u32>>,
    pub bits_per_sample: Option<u32>,
    pub order: Option<u32>,
    pub decode: Option<Vec<f32>>,

    /// The decoded contents of a type 0 function's stream
    pub samples: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// An array of 2 * m numbers, where m shall be the number of input values.
    /// For each i from 0 to m - 1, Domain2i shall be less than or equal to Domain2i+1,
    /// and the ith input value, xi, shall lie in the interval Domain2i <= xi <= Domain2i+1.
    /// Input values outside the declared domain shall be clipped to the nearest boundary
    /// value.
    domain: Vec<f32>,

    /// An array of 2 * n numbers, where n shall be the number of output values. For
    /// each j from 0 to n - 1, Range2j shall be less than or equal to Range2j+1,
    /// and the jth output value, yj , shall lie in the interval Range2j <= yj <= Range2j+1.
    /// Output values outside the declared range shall be clipped to the nearest
    /// boundary value. If this entry is absent, no clipping shall be done.
    range: Option<Vec<f32>>,

    subtype: FunctionSubtype,
}

impl Function {
    pub fn from_dict(dict: &FunctionDict) -> EvalResult<Self> {
        let function_type = dict
            .function_type
            .ok_or(EvalError::MissingRequiredKey {
                key: "FunctionType",
            })?;
        let function_type = FunctionType::from_integer(function_type)?;

        let domain = dict
            .domain
            .clone()
            .ok_or(EvalError::MissingRequiredKey { key: "Domain" })?;
        check_intervals(&domain, "Domain")?;

        let range = dict.range.clone();
        if let Some(range) = &range {
            check_intervals(range, "Range")?;
        }

        let subtype = match function_type {
            FunctionType::Sampled => {
                FunctionSubtype::Sampled(SampledFunction::from_dict(dict, &domain, range.as_deref())?)
            }
            FunctionType::ExponentialInterpolation => FunctionSubtype::ExponentialInterpolation(
                ExponentialInterpolationFunction::from_dict(dict, &domain, range.as_deref())?,
            ),
            FunctionType::Stitching => FunctionSubtype::Stitching(StitchingFunction::from_dict(
                dict,
                &domain,
                range.as_deref(),
            )?),
        };

        Ok(Self {
            domain,
            range,
            subtype,
        })
    }

    /// m, the number of input values
    pub fn input_count(&self) -> usize {
        self.domain.len() / 2
    }

    /// n, the number of output values
    pub fn output_count(&self) -> usize {
        match &self.range {
            Some(range) => range.len() / 2,
            None => match &self.subtype {
                FunctionSubtype::Sampled(sampled) => sampled.output_count(),
                FunctionSubtype::ExponentialInterpolation(exponential) => {
                    exponential.output_count()
                }
                FunctionSubtype::Stitching(stitching) => stitching.output_count(),
            },
        }
    }

    pub fn evaluate(&self, inputs: &[f32]) -> EvalResult<Vec<f32>> {
        if inputs.len() != self.input_count() {
            return Err(EvalError::InputArity {
                expected: self.input_count(),
                found: inputs.len(),
            });
        }

        let inputs = clip(inputs, &self.domain);

        let outputs = match &self.subtype {
            FunctionSubtype::Sampled(sampled) => sampled.evaluate(&inputs, &self.domain),
            FunctionSubtype::ExponentialInterpolation(exponential) => {
                exponential.evaluate(inputs[0])
            }
            FunctionSubtype::Stitching(stitching) => stitching.evaluate(inputs[0], &self.domain)?,
        };

        Ok(match &self.range {
            Some(range) => clip(&outputs, range),
            None => outputs,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FunctionSubtype {
    Sampled(SampledFunction),
    ExponentialInterpolation(ExponentialInterpolationFunction),
    Stitching(StitchingFunction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    Sampled = 0,
    ExponentialInterpolation = 2,
    Stitching = 3,
}

impl FunctionType {
    fn from_integer(function_type: i32) -> EvalResult<Self> {
        Ok(match function_type {
            0 => Self::Sampled,
            2 => Self::ExponentialInterpolation,
            3 => Self::Stitching,
            _ => return Err(EvalError::UnsupportedFunctionType(function_type)),
        })
    }
}

/// Linearly maps `x` from `[x0, x1]` onto `[y0, y1]`
///
/// An empty source interval maps everything to `y0`.
pub fn interpolate(x: f32, x0: f32, x1: f32, y0: f32, y1: f32) -> f32 {
    if x1 == x0 {
        return y0;
    }

    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// `values` clipped to the pairs of `intervals`. Extra values are left as-is
fn clip(values: &[f32], intervals: &[f32]) -> Vec<f32> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| match intervals.get(2 * i..2 * i + 2) {
            Some(&[min, max]) => v.max(min).min(max),
            _ => v,
        })
        .collect()
}

fn check_intervals(intervals: &[f32], key: &'static str) -> EvalResult<()> {
    if intervals.is_empty() || intervals.len() % 2 != 0 {
        return Err(EvalError::malformed(format!(
            "{} must hold a non-empty list of pairs, found {} values",
            key,
            intervals.len()
        )));
    }

    if intervals
        .chunks_exact(2)
        .any(|pair| !(pair[0] <= pair[1]))
    {
        return Err(EvalError::malformed(format!(
            "{} has an interval whose minimum exceeds its maximum",
            key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    pub(super) fn exponential(c0: &[f32], c1: &[f32], n: f32) -> FunctionDict {
        FunctionDict {
            function_type: Some(2),
            domain: Some(vec![0.0, 1.0]),
            c0: Some(c0.to_vec()),
            c1: Some(c1.to_vec()),
            n: Some(n),
            ..FunctionDict::default()
        }
    }

    #[test]
    fn interpolate_is_affine() {
        assert_eq!(interpolate(2.0, 2.0, 6.0, 10.0, 20.0), 10.0);
        assert_eq!(interpolate(6.0, 2.0, 6.0, 10.0, 20.0), 20.0);
        assert_eq!(interpolate(4.0, 2.0, 6.0, 10.0, 20.0), 15.0);
        assert_eq!(interpolate(0.5, 0.0, 1.0, 1.0, 0.0), 0.5);
    }

    #[test]
    fn interpolate_degenerate_domain() {
        assert_eq!(interpolate(7.0, 3.0, 3.0, 1.0, 9.0), 1.0);
        assert_eq!(interpolate(-1.0, 0.0, 0.0, -4.0, 4.0), -4.0);
    }

    #[test]
    fn inputs_are_clipped_to_domain() {
        let f = Function::from_dict(&exponential(&[0.0], &[10.0], 1.0)).unwrap();

        assert_eq!(f.evaluate(&[2.0]).unwrap(), vec![10.0]);
        assert_eq!(f.evaluate(&[-1.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn outputs_are_clipped_to_range() {
        let f = Function::from_dict(&FunctionDict {
            range: Some(vec![0.0, 5.0, 0.0, 1.0]),
            ..exponential(&[0.0, 0.0], &[10.0, 0.5], 1.0)
        })
        .unwrap();

        assert_eq!(f.output_count(), 2);
        assert_eq!(f.evaluate(&[1.0]).unwrap(), vec![5.0, 0.5]);
    }

    #[test]
    fn input_arity_is_checked() {
        let f = Function::from_dict(&exponential(&[0.0], &[1.0], 1.0)).unwrap();

        assert_eq!(f.input_count(), 1);
        assert_eq!(
            f.evaluate(&[0.1, 0.2]),
            Err(EvalError::InputArity {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(
            f.evaluate(&[]),
            Err(EvalError::InputArity {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn function_type_is_required_and_known() {
        assert_eq!(
            Function::from_dict(&FunctionDict::default()),
            Err(EvalError::MissingRequiredKey {
                key: "FunctionType"
            })
        );

        let postscript = FunctionDict {
            function_type: Some(4),
            ..exponential(&[0.0], &[1.0], 1.0)
        };
        assert_eq!(
            Function::from_dict(&postscript),
            Err(EvalError::UnsupportedFunctionType(4))
        );
    }

    #[test]
    fn domain_and_range_must_be_pairs() {
        let no_domain = FunctionDict {
            domain: None,
            ..exponential(&[0.0], &[1.0], 1.0)
        };
        assert_eq!(
            Function::from_dict(&no_domain),
            Err(EvalError::MissingRequiredKey { key: "Domain" })
        );

        let odd_domain = FunctionDict {
            domain: Some(vec![0.0, 1.0, 2.0]),
            ..exponential(&[0.0], &[1.0], 1.0)
        };
        assert!(matches!(
            Function::from_dict(&odd_domain),
            Err(EvalError::MalformedFunction(..))
        ));

        let inverted_range = FunctionDict {
            range: Some(vec![1.0, 0.0]),
            ..exponential(&[0.0], &[1.0], 1.0)
        };
        assert!(matches!(
            Function::from_dict(&inverted_range),
            Err(EvalError::MalformedFunction(..))
        ));
    }
}

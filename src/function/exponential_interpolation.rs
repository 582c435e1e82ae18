use crate::error::{EvalError, EvalResult};

use super::FunctionDict;

/// Type 2 functions (PDF 1.3) include a set of parameters that define an exponential
/// interpolation of one input value and n output values
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialInterpolationFunction {
    /// An array of n numbers that shall define the function result when x = 0.0.
    ///
    /// Default value: [0.0]
    c0: Vec<f32>,

    /// An array of n numbers that shall define the function result when x = 1.0.
    ///
    /// Default value: [1.0]
    c1: Vec<f32>,

    /// The interpolation exponent. Each input value x shall return n values, given by
    /// yj = C0j + xN * (C1j - C0j), for 0 <= j < n
    n: f32,
}

impl ExponentialInterpolationFunction {
    pub fn from_dict(dict: &FunctionDict, domain: &[f32], range: Option<&[f32]>) -> EvalResult<Self> {
        let c0 = dict.c0.clone().unwrap_or_else(|| vec![0.0]);
        let c1 = dict.c1.clone().unwrap_or_else(|| vec![1.0]);
        let n = dict.n.ok_or(EvalError::MissingRequiredKey { key: "N" })?;

        if domain.len() != 2 {
            return Err(EvalError::malformed(
                "exponential interpolation functions take exactly one input",
            ));
        }

        if c0.len() != c1.len() {
            return Err(EvalError::malformed(format!(
                "C0 has {} values but C1 has {}",
                c0.len(),
                c1.len()
            )));
        }

        if let Some(range) = range {
            if range.len() != 2 * c0.len() {
                return Err(EvalError::malformed(format!(
                    "Range describes {} outputs but C0 has {} values",
                    range.len() / 2,
                    c0.len()
                )));
            }
        }

        // x^N is only real-valued for negative x when N is an integer
        if n.fract() != 0.0 && domain[0] < 0.0 {
            return Err(EvalError::malformed(
                "non-integral N requires a non-negative Domain",
            ));
        }

        // and only finite at x = 0 when N is non-negative
        if n < 0.0 && domain[0] <= 0.0 && domain[1] >= 0.0 {
            return Err(EvalError::malformed("negative N requires 0 outside of Domain"));
        }

        Ok(Self { c0, c1, n })
    }

    pub fn output_count(&self) -> usize {
        self.c0.len()
    }

    pub fn evaluate(&self, x: f32) -> Vec<f32> {
        let t = x.powf(self.n);

        self.c0
            .iter()
            .zip(&self.c1)
            .map(|(&c0, &c1)| c0 + t * (c1 - c0))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::function::{test::exponential, Function};

    #[test]
    fn linear_and_curved() {
        let linear = Function::from_dict(&exponential(&[0.0, 1.0], &[1.0, 0.0], 1.0)).unwrap();
        assert_eq!(linear.evaluate(&[0.25]).unwrap(), vec![0.25, 0.75]);

        let squared = Function::from_dict(&exponential(&[0.0], &[1.0], 2.0)).unwrap();
        assert_eq!(squared.evaluate(&[0.5]).unwrap(), vec![0.25]);
        assert_eq!(squared.evaluate(&[1.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn defaults() {
        let f = Function::from_dict(&FunctionDict {
            c0: None,
            c1: None,
            ..exponential(&[], &[], 1.0)
        })
        .unwrap();

        assert_eq!(f.output_count(), 1);
        assert_eq!(f.evaluate(&[0.3]).unwrap(), vec![0.3]);
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            Function::from_dict(&FunctionDict {
                n: None,
                ..exponential(&[0.0], &[1.0], 1.0)
            }),
            Err(EvalError::MissingRequiredKey { key: "N" })
        );

        let mismatched = exponential(&[0.0, 0.0], &[1.0], 1.0);
        assert!(matches!(
            Function::from_dict(&mismatched),
            Err(EvalError::MalformedFunction(..))
        ));

        let fractional_on_negative = FunctionDict {
            domain: Some(vec![-1.0, 1.0]),
            ..exponential(&[0.0], &[1.0], 0.5)
        };
        assert!(matches!(
            Function::from_dict(&fractional_on_negative),
            Err(EvalError::MalformedFunction(..))
        ));

        let negative_through_zero = exponential(&[0.0], &[1.0], -1.0);
        assert!(matches!(
            Function::from_dict(&negative_through_zero),
            Err(EvalError::MalformedFunction(..))
        ));

        let negative_away_from_zero = FunctionDict {
            domain: Some(vec![1.0, 2.0]),
            ..exponential(&[0.0], &[1.0], -1.0)
        };
        let f = Function::from_dict(&negative_away_from_zero).unwrap();
        assert_eq!(f.evaluate(&[2.0]).unwrap(), vec![0.5]);

        let two_inputs = FunctionDict {
            domain: Some(vec![0.0, 1.0, 0.0, 1.0]),
            ..exponential(&[0.0], &[1.0], 1.0)
        };
        assert!(matches!(
            Function::from_dict(&two_inputs),
            Err(EvalError::MalformedFunction(..))
        ));
    }
}

use crate::error::{EvalError, EvalResult};

use super::{interpolate, Function, FunctionDict};

/// Type 3 functions (PDF 1.3) define a stitching of the subdomains of several 1-input functions to
/// produce a single new 1-input function. Since the resulting stitching function is a 1-input function,
/// the domain is given by a twoelement array, [Domain0 Domain1].
#[derive(Debug, Clone, PartialEq)]
pub struct StitchingFunction {
    /// An array of k 1-input functions that shall make up the stitching function. The output
    /// dimensionality of all functions shall be the same, and compatible with the value of Range if Range
    /// is present
    functions: Vec<Function>,

    /// An array of k - 1 numbers that, in combination with Domain, shall define the intervals to which
    /// each function from the Functions array shall apply. Bounds elements shall be in order of
    /// increasing value, and each value shall be within the domain defined by Domain
    bounds: Vec<f32>,

    /// An array of 2 * k numbers that, taken in pairs, shall map each subset of the domain defined by
    /// Domain and the Bounds array to the domain of the corresponding function
    encode: Vec<f32>,
}

impl StitchingFunction {
    pub fn from_dict(dict: &FunctionDict, domain: &[f32], range: Option<&[f32]>) -> EvalResult<Self> {
        if domain.len() != 2 {
            return Err(EvalError::malformed(
                "stitching functions take exactly one input",
            ));
        }

        let functions = dict
            .functions
            .as_ref()
            .ok_or(EvalError::MissingRequiredKey { key: "Functions" })?
            .iter()
            .map(Function::from_dict)
            .collect::<EvalResult<Vec<Function>>>()?;

        let bounds = dict
            .bounds
            .clone()
            .ok_or(EvalError::MissingRequiredKey { key: "Bounds" })?;

        let encode = dict
            .encode
            .clone()
            .ok_or(EvalError::MissingRequiredKey { key: "Encode" })?;

        let k = functions.len();

        if k == 0 {
            return Err(EvalError::malformed("Functions must not be empty"));
        }

        if bounds.len() != k - 1 {
            return Err(EvalError::malformed(format!(
                "expected {} Bounds for {} functions, found {}",
                k - 1,
                k,
                bounds.len()
            )));
        }

        if encode.len() != 2 * k {
            return Err(EvalError::malformed(format!(
                "expected {} Encode values for {} functions, found {}",
                2 * k,
                k,
                encode.len()
            )));
        }

        if functions.iter().any(|f| f.input_count() != 1) {
            return Err(EvalError::malformed(
                "every stitched function must take exactly one input",
            ));
        }

        let output_count = functions[0].output_count();
        if functions.iter().any(|f| f.output_count() != output_count) {
            return Err(EvalError::malformed(
                "stitched functions disagree on their number of outputs",
            ));
        }

        if let Some(range) = range {
            if range.len() / 2 != output_count {
                return Err(EvalError::malformed(format!(
                    "Range describes {} outputs but the stitched functions produce {}",
                    range.len() / 2,
                    output_count
                )));
            }
        }

        if bounds.windows(2).any(|pair| !(pair[0] < pair[1])) {
            return Err(EvalError::malformed("Bounds must be strictly increasing"));
        }

        if bounds.iter().any(|&b| !(domain[0] <= b && b <= domain[1])) {
            return Err(EvalError::malformed("Bounds must lie within Domain"));
        }

        Ok(Self {
            functions,
            bounds,
            encode,
        })
    }

    pub fn output_count(&self) -> usize {
        self.functions
            .first()
            .map_or(0, Function::output_count)
    }

    /// `x` has already been clipped to `domain`
    pub fn evaluate(&self, x: f32, domain: &[f32]) -> EvalResult<Vec<f32>> {
        // an input equal to a bound belongs to the interval starting at it
        let subdomain = self.bounds.iter().take_while(|&&b| x >= b).count();

        let bound_min = match subdomain {
            0 => domain[0],
            _ => self.bounds[subdomain - 1],
        };

        let bound_max = self.bounds.get(subdomain).copied().unwrap_or(domain[1]);

        let encoded = interpolate(
            x,
            bound_min,
            bound_max,
            self.encode[2 * subdomain],
            self.encode[2 * subdomain + 1],
        );

        self.functions[subdomain].evaluate(&[encoded])
    }
}

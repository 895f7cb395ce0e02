use crate::api::error::{NnError, NnResult};
use rand::Rng;
use syncml_core::{with_rng, Tensor};

/// Dropout layer.
///
/// In training mode, zeroes elements with probability `p` and scales the
/// survivors by `1 / (1 - p)` (inverted dropout). In evaluation mode it is
/// the identity. Layers start in evaluation mode since this workspace only
/// runs inference.
#[derive(Debug, Clone)]
pub struct Dropout {
    p: f32,
    training: bool,
}

impl Dropout {
    /// Create a dropout layer with drop probability `p` in [0, 1).
    pub fn new(p: f32) -> NnResult<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(NnError::InvalidConfig(format!(
                "Dropout probability must be in [0, 1), got {}",
                p
            )));
        }
        Ok(Self { p, training: false })
    }

    /// Switch to training mode (dropout active).
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Switch to evaluation mode (identity pass-through).
    pub fn eval(&mut self) {
        self.training = false;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn p(&self) -> f32 {
        self.p
    }

    pub fn forward(&self, input: &Tensor) -> NnResult<Tensor> {
        if !self.training || self.p == 0.0 {
            return Ok(input.clone());
        }

        let scale = 1.0 / (1.0 - self.p);
        let mask: Vec<f32> = with_rng(|rng| {
            (0..input.numel())
                .map(|_| if rng.r#gen::<f32>() >= self.p { scale } else { 0.0 })
                .collect()
        });
        let mask = Tensor::from_vec(mask, input.shape().to_vec())?;
        Ok(input.mul(&mask)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropout_rejects_bad_p() {
        assert!(Dropout::new(1.0).is_err());
        assert!(Dropout::new(-0.1).is_err());
        assert!(Dropout::new(0.0).is_ok());
    }

    #[test]
    fn test_dropout_eval_is_identity() {
        let d = Dropout::new(0.5).unwrap();
        let x = Tensor::randn([4, 4]);
        assert_eq!(d.forward(&x).unwrap().to_vec(), x.to_vec());
    }

    #[test]
    fn test_dropout_train_scales_survivors() {
        let mut d = Dropout::new(0.5).unwrap();
        d.train();
        let y = d.forward(&Tensor::ones(vec![1000])).unwrap();
        assert!(y.iter().all(|v| v == 0.0 || (v - 2.0).abs() < 1e-6));
        let kept = y.iter().filter(|&v| v > 0.0).count();
        assert!(kept > 350 && kept < 650);
    }
}

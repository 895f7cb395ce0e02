//! Neural network traits

use syncml_core::Tensor;

/// A layer that owns named parameters.
///
/// Names are dotted paths (`"attn.q_proj.weight"`) built by prefixing each
/// child's local name with its parent's, which is also how weight files key
/// their tensors.
pub trait Module {
    /// Call `f` with the full name and value of every parameter, in a stable order.
    fn visit_parameters(&self, prefix: &str, f: &mut dyn FnMut(&str, &Tensor));

    /// Mutable counterpart of [`Module::visit_parameters`], same names and order.
    fn visit_parameters_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut Tensor));

    /// Total number of scalar parameters.
    fn parameter_count(&self) -> usize {
        let mut total = 0;
        self.visit_parameters("", &mut |_, t| total += t.numel());
        total
    }
}

/// Join a parent prefix and a local parameter name with a dot.
pub fn param_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_name() {
        assert_eq!(param_name("", "weight"), "weight");
        assert_eq!(param_name("out.1", "bias"), "out.1.bias");
    }
}

//! View processors.

use crate::source::TemplateSource;
use view_expr::Bindings;

/// A hook that runs before every top-level render and may add or rewrite
/// bindings.
pub trait ViewProcessor: Send + Sync {
    fn process(&self, view: &TemplateSource, bindings: &mut Bindings);
}

impl<F> ViewProcessor for F
where
    F: Fn(&TemplateSource, &mut Bindings) + Send + Sync,
{
    fn process(&self, view: &TemplateSource, bindings: &mut Bindings) {
        self(view, bindings)
    }
}

/// Binds a fixed set of values into every view, without overriding names
/// the caller already bound.
#[derive(Debug, Clone, Default)]
pub struct SharedBindings {
    bindings: Bindings,
}

impl SharedBindings {
    pub fn new(bindings: Bindings) -> Self {
        Self { bindings }
    }
}

impl ViewProcessor for SharedBindings {
    fn process(&self, _view: &TemplateSource, bindings: &mut Bindings) {
        for (name, value) in &self.bindings {
            if !bindings.contains_key(name) {
                bindings.insert(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use view_expr::Value;

    #[test]
    fn test_shared_bindings_do_not_override() {
        let shared = SharedBindings::new(Bindings::from_iter([
            ("site".into(), Value::from("Docs")),
            ("title".into(), Value::from("Default")),
        ]));
        let mut bindings = Bindings::from_iter([("title".into(), Value::from("Home"))]);

        shared.process(&TemplateSource::inline(""), &mut bindings);

        assert_eq!(bindings["title"], Value::from("Home"));
        assert_eq!(bindings["site"], Value::from("Docs"));
    }

    #[test]
    fn test_closure_processor() {
        let processor = |_: &TemplateSource, bindings: &mut Bindings| {
            bindings.insert("global".into(), Value::from("test"));
        };
        let mut bindings = Bindings::new();
        ViewProcessor::process(&processor, &TemplateSource::inline(""), &mut bindings);
        assert_eq!(bindings["global"], Value::from("test"));
    }
}

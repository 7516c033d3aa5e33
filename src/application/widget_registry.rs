// Widget registry - Component name to renderable unit
use crate::application::builtin_widgets;
use crate::domain::view::WidgetBody;
use crate::domain::widget::WidgetProps;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Something that can turn a prop set into widget content.
pub trait WidgetUnit: Send + Sync {
    fn title(&self, props: &WidgetProps) -> Option<String> {
        props.base.title()
    }

    fn render(&self, props: &WidgetProps) -> WidgetBody;
}

impl<F> WidgetUnit for F
where
    F: Fn(&WidgetProps) -> WidgetBody + Send + Sync,
{
    fn render(&self, props: &WidgetProps) -> WidgetBody {
        self(props)
    }
}

/// Shared lookup table. Writes happen at startup and at explicit extension
/// points; the lock keeps readers from seeing a partial update.
#[derive(Default)]
pub struct WidgetRegistry {
    units: RwLock<HashMap<String, Arc<dyn WidgetUnit>>>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in widget.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        builtin_widgets::register_builtins(&registry);
        registry
    }

    pub fn get(&self, component_name: &str) -> Option<Arc<dyn WidgetUnit>> {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(component_name)
            .cloned()
    }

    /// Last registration for a name wins.
    pub fn register(&self, component_name: impl Into<String>, unit: Arc<dyn WidgetUnit>) {
        let component_name = component_name.into();
        let replaced = self
            .units
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(component_name.clone(), unit)
            .is_some();

        tracing::debug!(component_name = %component_name, replaced, "Registered widget");
    }

    pub fn component_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::widget::WidgetKind;

    fn notice(message: &'static str) -> Arc<dyn WidgetUnit> {
        Arc::new(move |_: &WidgetProps| WidgetBody::Notice {
            message: message.to_string(),
        })
    }

    #[test]
    fn test_builtins_registered() {
        let registry = WidgetRegistry::with_builtins();
        for kind in WidgetKind::BUILT_IN {
            assert!(registry.get(kind.component_name()).is_some(), "{:?}", kind);
        }
        assert_eq!(registry.component_names().len(), WidgetKind::BUILT_IN.len());
    }

    #[test]
    fn test_lookup_of_unknown_name_is_none() {
        let registry = WidgetRegistry::with_builtins();
        assert!(registry.get("UnknownWidget").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = WidgetRegistry::new();
        registry.register("Custom", notice("first"));
        registry.register("Custom", notice("second"));

        let props = crate::application::prop_deriver::tests::props_for("Custom");
        let unit = registry.get("Custom").unwrap();
        assert_eq!(
            unit.render(&props),
            WidgetBody::Notice {
                message: "second".to_string()
            }
        );
    }
}

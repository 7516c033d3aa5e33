// Widget dispatcher - Resolves a component name and renders it in its chrome
use crate::application::widget_registry::WidgetRegistry;
use crate::application::widget_wrapper;
use crate::domain::view::RenderedWidget;
use crate::domain::widget::WidgetProps;
use std::sync::Arc;

#[derive(Clone)]
pub struct WidgetDispatcher {
    registry: Arc<WidgetRegistry>,
}

impl WidgetDispatcher {
    pub fn new(registry: Arc<WidgetRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<WidgetRegistry> {
        &self.registry
    }

    /// Never fails: an unknown name renders a placeholder naming it.
    pub fn render(&self, component_name: &str, props: &WidgetProps) -> RenderedWidget {
        let Some(unit) = self.registry.get(component_name) else {
            tracing::debug!(component_name, "No widget registered for component");
            return RenderedWidget::NotFound {
                component_name: component_name.to_string(),
                message: format!("Widget component \"{}\" not found", component_name),
            };
        };

        RenderedWidget::Widget(widget_wrapper::wrap(
            unit.title(props),
            props.base.loading,
            props.base.error.as_deref(),
            || unit.render(props),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prop_deriver::tests::props_for;
    use crate::domain::view::{WidgetBody, WidgetContent};

    #[test]
    fn test_unknown_widget_renders_placeholder_with_name() {
        let dispatcher = WidgetDispatcher::new(Arc::new(WidgetRegistry::with_builtins()));
        let rendered = dispatcher.render("UnknownWidget", &props_for("UnknownWidget"));

        match rendered {
            RenderedWidget::NotFound { component_name, message } => {
                assert_eq!(component_name, "UnknownWidget");
                assert!(message.contains("\"UnknownWidget\""));
            }
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_loading_flag_forwarded_to_chrome() {
        let dispatcher = WidgetDispatcher::new(Arc::new(WidgetRegistry::with_builtins()));
        let mut props = props_for("KPIWidget");
        props.base.loading = true;

        match dispatcher.render("KPIWidget", &props) {
            RenderedWidget::Widget(chrome) => assert_eq!(chrome.content, WidgetContent::Loading),
            other => panic!("expected widget, got {:?}", other),
        }
    }

    #[test]
    fn test_registered_extension_is_dispatched() {
        let registry = Arc::new(WidgetRegistry::new());
        registry.register(
            "Custom",
            Arc::new(|props: &WidgetProps| WidgetBody::Notice {
                message: format!("{} keys", props.base.config.len()),
            }),
        );
        let dispatcher = WidgetDispatcher::new(registry);

        match dispatcher.render("Custom", &props_for("Custom")) {
            RenderedWidget::Widget(chrome) => assert_eq!(
                chrome.content,
                WidgetContent::Ready {
                    body: WidgetBody::Notice {
                        message: "0 keys".to_string()
                    }
                }
            ),
            other => panic!("expected widget, got {:?}", other),
        }
    }
}

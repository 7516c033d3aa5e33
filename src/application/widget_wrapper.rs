// Widget wrapper - Shared title, loading and error chrome
use crate::domain::view::{WidgetBody, WidgetChrome, WidgetContent};

/// Wrap unit content in the standard chrome. Loading wins over error, and the
/// content closure only runs when its output will be shown.
pub fn wrap<F>(title: Option<String>, loading: bool, error: Option<&str>, content: F) -> WidgetChrome
where
    F: FnOnce() -> WidgetBody,
{
    let content = if loading {
        WidgetContent::Loading
    } else if let Some(message) = error {
        WidgetContent::Error {
            message: message.to_string(),
        }
    } else {
        WidgetContent::Ready { body: content() }
    };

    WidgetChrome { title, content }
}

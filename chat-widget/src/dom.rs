use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlTextAreaElement};

use crate::config::ElementIds;
use crate::error::WidgetError;

pub fn document() -> Result<Document, WidgetError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or(WidgetError::NoWindow)
}

/// Handles to the rendered widget elements the view manipulates directly.
#[derive(Debug, Clone)]
pub struct ChatElements {
    pub input: HtmlTextAreaElement,
    pub send_button: HtmlElement,
    pub message_log: Element,
    pub clear_chat: Element,
    pub status_dot: HtmlElement,
    pub status_text: Element,
    pub clear_input: Option<Element>,
}

impl ChatElements {
    pub fn resolve(document: &Document, ids: &ElementIds) -> Result<Self, WidgetError> {
        Ok(Self {
            input: typed(document, &ids.message_input)?,
            send_button: typed(document, &ids.send_button)?,
            message_log: required(document, &ids.message_log)?,
            clear_chat: required(document, &ids.clear_chat)?,
            status_dot: typed(document, &ids.status_dot)?,
            status_text: required(document, &ids.status_text)?,
            clear_input: ids
                .clear_input
                .as_deref()
                .and_then(|id| document.get_element_by_id(id)),
        })
    }

    pub fn from_page(ids: &ElementIds) -> Result<Self, WidgetError> {
        Self::resolve(&document()?, ids)
    }

    pub fn scroll_log_to_bottom(&self) {
        self.message_log
            .set_scroll_top(self.message_log.scroll_height());
    }

    /// Grows the input with its content up to `max_px`.
    pub fn fit_input_height(&self, max_px: u32) -> Result<(), WidgetError> {
        let style = self.input.style();
        style.set_property("height", "auto").map_err(WidgetError::dom)?;
        let height = input_height(self.input.scroll_height(), max_px);
        style
            .set_property("height", &format!("{height}px"))
            .map_err(WidgetError::dom)
    }

    pub fn reset_input_height(&self) -> Result<(), WidgetError> {
        self.input
            .style()
            .set_property("height", "auto")
            .map_err(WidgetError::dom)
    }

    pub fn focus_input(&self) {
        if let Err(e) = self.input.focus() {
            dioxus_logger::tracing::debug!("focus failed: {}", crate::error::describe_js(&e));
        }
    }
}

fn required(document: &Document, id: &str) -> Result<Element, WidgetError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| WidgetError::MissingElement(id.to_string()))
}

fn typed<T: JsCast>(document: &Document, id: &str) -> Result<T, WidgetError> {
    required(document, id)?
        .dyn_into::<T>()
        .map_err(|_| WidgetError::Dom(format!("#{id} has an unexpected element type")))
}

pub fn input_height(scroll_height: i32, max_px: u32) -> u32 {
    u32::try_from(scroll_height).unwrap_or(0).min(max_px)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_height_is_capped() {
        assert_eq!(input_height(40, 120), 40);
        assert_eq!(input_height(120, 120), 120);
        assert_eq!(input_height(400, 120), 120);
    }

    #[test]
    fn negative_scroll_height_collapses_to_zero() {
        assert_eq!(input_height(-5, 120), 0);
    }
}

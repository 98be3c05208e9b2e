use gpui::{
    Context, IntoElement, ParentElement as _, Render, SharedString, Styled as _, Window, div, px,
};
use gpui_component::{ActiveTheme as _, StyledExt as _};

pub(crate) struct DragGhost {
    label: SharedString,
    badge: Option<SharedString>,
}

impl DragGhost {
    pub(crate) fn new(label: SharedString) -> Self {
        Self { label, badge: None }
    }

    /// Small trailing note, e.g. the number of children travelling along.
    pub(crate) fn badge(mut self, badge: impl Into<SharedString>) -> Self {
        self.badge = Some(badge.into());
        self
    }
}

impl Render for DragGhost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let mut ghost = div()
            .flex()
            .gap_2()
            .px(px(10.))
            .py(px(6.))
            .rounded(px(8.))
            .bg(theme.popover)
            .border_1()
            .border_color(theme.border)
            .shadow_md()
            .text_color(theme.popover_foreground)
            .text_sm()
            .child(self.label.clone());
        if let Some(badge) = self.badge.clone() {
            ghost = ghost.child(div().text_color(theme.muted_foreground).child(badge));
        }
        ghost
    }
}

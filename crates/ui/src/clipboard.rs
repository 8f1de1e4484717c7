use anyhow::Context as _;

pub(crate) trait Clipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// System clipboard, opened on first use. The handle stays alive for the
/// session because on X11 copied text disappears with its owner.
#[derive(Default)]
pub(crate) struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().context("open system clipboard")?,
        };
        self.inner
            .insert(clipboard)
            .set_text(text)
            .context("write system clipboard")
    }
}

/// What "executing" a script means is up to the embedder; the page only decides when.
pub trait PageHost {
    /// Run inline script text synchronously.
    fn run_inline(&mut self, code: &str);
    /// An external script element with this absolute `src` was attached.
    fn load_external(&mut self, src: &str);
    /// Blocking native alert; the last-resort notification surface.
    fn alert(&mut self, message: &str);
}

/// Logs script activity and executes nothing.
#[derive(Debug, Default)]
pub struct LogHost;

impl PageHost for LogHost {
    fn run_inline(&mut self, code: &str) {
        log::info!("inline script ({} bytes)", code.len());
    }

    fn load_external(&mut self, src: &str) {
        log::info!("external script: {src}");
    }

    fn alert(&mut self, message: &str) {
        log::warn!("alert: {message}");
    }
}

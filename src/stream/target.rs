use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::render::Markup;

/// Where the simulator writes an assistant message's body.
pub trait RenderTarget: Send {
    fn clear(&mut self) -> Result<(), TargetError>;
    fn set_markup(&mut self, markup: Markup) -> Result<(), TargetError>;
    /// Literal text, shown as-is.
    fn set_plain(&mut self, text: &str) -> Result<(), TargetError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetError {
    /// Another holder of the body panicked while writing it.
    Poisoned,
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::Poisoned => write!(f, "render target lock poisoned"),
        }
    }
}

impl std::error::Error for TargetError {}

/// Display state of one bubble body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// Nothing revealed yet; the bubble shows a typing indicator.
    #[default]
    Pending,
    Markup(Markup),
}

impl Body {
    pub fn is_pending(&self) -> bool {
        matches!(self, Body::Pending)
    }
}

#[derive(Debug, Default)]
struct Inner {
    body: Body,
    /// Bumped on every write so readers can cache layout per revision.
    revision: u64,
}

/// Cloneable handle to a bubble body, shared by the simulator task (writer)
/// and the message list (reader).
#[derive(Debug, Clone, Default)]
pub struct SharedBody {
    inner: Arc<Mutex<Inner>>,
}

impl SharedBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markup(markup: Markup) -> Self {
        let body = Self::new();
        if let Ok(mut inner) = body.inner.lock() {
            inner.body = Body::Markup(markup);
        }
        body
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, TargetError> {
        self.inner.lock().map_err(|_| TargetError::Poisoned)
    }

    fn write(&self, body: Body) -> Result<(), TargetError> {
        let mut inner = self.lock()?;
        inner.body = body;
        inner.revision = inner.revision.wrapping_add(1);
        Ok(())
    }

    /// Copy of the current body and its revision.
    pub fn snapshot(&self) -> Result<(Body, u64), TargetError> {
        let inner = self.lock()?;
        Ok((inner.body.clone(), inner.revision))
    }

    pub fn revision(&self) -> u64 {
        self.lock().map(|inner| inner.revision).unwrap_or(0)
    }

    /// Runs `f` against the body without cloning it.
    pub fn with_body<R>(&self, f: impl FnOnce(&Body) -> R) -> Result<R, TargetError> {
        let inner = self.lock()?;
        Ok(f(&inner.body))
    }
}

impl RenderTarget for SharedBody {
    fn clear(&mut self) -> Result<(), TargetError> {
        self.write(Body::Pending)
    }

    fn set_markup(&mut self, markup: Markup) -> Result<(), TargetError> {
        self.write(Body::Markup(markup))
    }

    fn set_plain(&mut self, text: &str) -> Result<(), TargetError> {
        self.write(Body::Markup(Markup::plain(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_bump_revision() {
        let mut body = SharedBody::new();
        assert_eq!(body.revision(), 0);
        body.set_plain("a").unwrap();
        body.set_plain("ab").unwrap();
        assert_eq!(body.revision(), 2);
        body.clear().unwrap();
        let (snapshot, rev) = body.snapshot().unwrap();
        assert!(snapshot.is_pending());
        assert_eq!(rev, 3);
    }

    #[test]
    fn clones_share_state() {
        let mut writer = SharedBody::new();
        let reader = writer.clone();
        writer.set_plain("hello").unwrap();
        let text = reader
            .with_body(|b| match b {
                Body::Markup(m) => m.to_plain_string(),
                Body::Pending => String::new(),
            })
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn poisoned_lock_reported() {
        let body = SharedBody::new();
        let clone = body.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.inner.lock().unwrap();
            panic!("poison");
        })
        .join();
        let mut body = body;
        assert_eq!(body.set_plain("x"), Err(TargetError::Poisoned));
    }
}

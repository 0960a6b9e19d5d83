//! Call frames.
//!
//! Variable lookup is strictly frame-local: a procedure body sees only its
//! own frame, never its caller's, and the global frame is visible only at
//! the top level.

use std::collections::HashMap;

/// Variables local to one procedure invocation, plus its latest result.
#[derive(Debug, Default, Clone)]
pub struct CallFrame {
    vars: HashMap<String, String>,
    pub result: String,
}

impl CallFrame {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: String) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn unset(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }
}

/// Stack of frames. The bottom (global) frame always exists.
#[derive(Debug)]
pub struct FrameStack {
    frames: Vec<CallFrame>,
}

impl FrameStack {
    pub fn new() -> Self {
        FrameStack {
            frames: vec![CallFrame::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(CallFrame::default());
    }

    /// Pop the innermost frame. The global frame is never popped.
    pub fn pop(&mut self) -> Option<CallFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Number of frames, including the global one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> &CallFrame {
        self.frames.last().expect("global frame always exists")
    }

    pub fn current_mut(&mut self) -> &mut CallFrame {
        self.frames.last_mut().expect("global frame always exists")
    }
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_frame_survives_pop() {
        let mut frames = FrameStack::new();
        assert_eq!(frames.depth(), 1);
        assert!(frames.pop().is_none());
        assert_eq!(frames.depth(), 1);
    }

    #[test]
    fn test_lookup_is_frame_local() {
        let mut frames = FrameStack::new();
        frames.current_mut().set("x", "1".to_string());
        frames.push();
        assert_eq!(frames.current().get("x"), None);
        frames.current_mut().set("x", "2".to_string());
        frames.pop();
        assert_eq!(frames.current().get("x"), Some("1"));
        assert_eq!(frames.depth(), 1);
    }
}

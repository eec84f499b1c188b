// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render errors.
//!
//! Any [`RenderError`] raised while a render pass walks the tree aborts the
//! whole pass: the work-in-progress tree is discarded and the committed tree
//! (and the host tree mirroring it) is left exactly as it was.

use alloc::borrow::Cow;
use alloc::string::String;

/// Why a render pass was aborted, or why an element could not be mounted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// An element's type cannot be turned into a work node.
    ///
    /// The reconciler logs this and skips the element's subtree; it never
    /// aborts a pass.
    #[error("unrecognized element type `{0}`")]
    UnrecognizedElementType(String),

    /// A component read a state cell with a different type than the one it
    /// was created with.
    #[error("component `{component}` read state cell {index} with a mismatched type")]
    StateCellType {
        /// Diagnostic name of the component.
        component: &'static str,
        /// Position of the cell in the component's call order.
        index: usize,
    },

    /// A component used a different number of state cells than it did when
    /// it was first rendered.
    #[error("component `{component}` used {used} state cells, but {expected} were committed")]
    StateCellCount {
        /// Diagnostic name of the component.
        component: &'static str,
        /// Number of cells committed by the previous render.
        expected: usize,
        /// Number of cells used by this render.
        used: usize,
    },

    /// A component reported a failure of its own.
    #[error("component `{component}` failed: {message}")]
    Component {
        /// Diagnostic name of the component.
        component: &'static str,
        /// Failure description.
        message: Cow<'static, str>,
    },
}

impl RenderError {
    /// Creates a [`RenderError::Component`].
    pub fn component(component: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Component {
            component,
            message: message.into(),
        }
    }
}

use std::rc::Rc;

use bbox_overlay_protocol::{AnnotationId, ControlKind, ThemeToken};
use serde::{Deserialize, Serialize};

/// Host callback fired when the user activates a control: `(id, accepted)`.
///
/// The engine only signals intent; acknowledging the decision upstream is
/// the host's job.
pub type AcknowledgeFn = Rc<dyn Fn(&AnnotationId, bool)>;

/// Which [`ControlAffordanceProvider`] builds the overlay controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffordanceKind {
    /// Host-rendered buttons. Touch friendly.
    #[default]
    InteractiveButtons,
    /// The viewer's own button widgets, with tooltips and element ids.
    NativeButtons,
}

/// One accept or reject affordance, wired to the host callback.
pub struct Control {
    pub kind: ControlKind,
    pub annotation: AnnotationId,
    /// Viewer element id, for providers that register named widgets.
    pub element_id: Option<String>,
    pub label: &'static str,
    pub tooltip: Option<&'static str>,
    pub token: ThemeToken,
    pub disabled: bool,
    on_activate: Option<AcknowledgeFn>,
}

impl Control {
    pub fn new(annotation: &AnnotationId, kind: ControlKind, on_activate: &AcknowledgeFn) -> Self {
        Self {
            kind,
            annotation: annotation.clone(),
            element_id: None,
            label: match kind {
                ControlKind::Accept => "✓",
                ControlKind::Reject => "✕",
            },
            tooltip: None,
            token: match kind {
                ControlKind::Accept => ThemeToken::AcceptControl,
                ControlKind::Reject => ThemeToken::RejectControl,
            },
            disabled: false,
            on_activate: Some(Rc::clone(on_activate)),
        }
    }

    /// Invoke the host callback. Returns `false` when the control is
    /// disabled or already released.
    pub fn activate(&self) -> bool {
        if self.disabled {
            return false;
        }
        match &self.on_activate {
            Some(callback) => {
                callback(&self.annotation, self.kind.is_accept());
                true
            }
            None => false,
        }
    }

    pub fn is_wired(&self) -> bool {
        self.on_activate.is_some()
    }

    fn unwire(&mut self) {
        self.on_activate = None;
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("kind", &self.kind)
            .field("annotation", &self.annotation)
            .field("element_id", &self.element_id)
            .field("label", &self.label)
            .field("tooltip", &self.tooltip)
            .field("disabled", &self.disabled)
            .field("wired", &self.is_wired())
            .finish()
    }
}

/// Builds the accept/reject controls of an overlay.
pub trait ControlAffordanceProvider {
    fn kind(&self) -> AffordanceKind;

    fn build(
        &self,
        annotation: &AnnotationId,
        kind: ControlKind,
        on_acknowledge: &AcknowledgeFn,
    ) -> Control;

    /// Detach the control from the host callback once its overlay is gone.
    fn release(&self, control: &mut Control) {
        control.unwire();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InteractiveButtons;

impl ControlAffordanceProvider for InteractiveButtons {
    fn kind(&self) -> AffordanceKind {
        AffordanceKind::InteractiveButtons
    }

    fn build(
        &self,
        annotation: &AnnotationId,
        kind: ControlKind,
        on_acknowledge: &AcknowledgeFn,
    ) -> Control {
        Control::new(annotation, kind, on_acknowledge)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeButtons {
    pub disabled: bool,
}

impl ControlAffordanceProvider for NativeButtons {
    fn kind(&self) -> AffordanceKind {
        AffordanceKind::NativeButtons
    }

    fn build(
        &self,
        annotation: &AnnotationId,
        kind: ControlKind,
        on_acknowledge: &AcknowledgeFn,
    ) -> Control {
        let mut control = Control::new(annotation, kind, on_acknowledge);
        let (prefix, tooltip) = match kind {
            ControlKind::Accept => ("accept", "Accept"),
            ControlKind::Reject => ("reject", "Reject"),
        };
        control.element_id = Some(format!("{prefix}-{annotation}"));
        control.tooltip = Some(tooltip);
        if self.disabled {
            control.disabled = true;
            control.token = ThemeToken::DisabledControl;
        }
        control
    }
}

/// Provider selected by `kind`. `disabled` only affects native buttons.
pub fn provider_for(kind: AffordanceKind, disabled: bool) -> Box<dyn ControlAffordanceProvider> {
    match kind {
        AffordanceKind::InteractiveButtons => Box::new(InteractiveButtons),
        AffordanceKind::NativeButtons => Box::new(NativeButtons { disabled }),
    }
}

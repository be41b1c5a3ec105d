//! External collaborators of the wheel controller.
//!
//! Haptics, sounds and animations are fire-and-forget: the controller calls
//! them and never waits. Every method has a no-op default so embedders only
//! implement what their platform supports.

use crate::wheel::{CommitRequest, HapticStyle};

/// Tactile and audible feedback.
pub trait Feedback {
    /// Light pulse on a notch crossing.
    fn tick(&self, _style: HapticStyle) {}

    /// Only called when `tick_sound_enabled` is set.
    fn tick_sound(&self) {}

    /// Only called when `should_play_success_haptic` is set.
    fn success(&self) {}

    fn success_sound(&self) {}
}

/// Animation hooks on the rendering side. Rendering itself is a pure
/// function of [`DialView`](crate::wheel::DialView).
pub trait WheelSurface {
    fn rotate_to(&self, _degrees: f64) {}

    /// Spring the wheel back to zero rotation after release.
    fn snap_back(&self) {}

    /// Start the confirm bar draining over `duration_ms`.
    fn start_confirm_bar(&self, _duration_ms: u64) {}

    fn fade_overlay(&self, _duration_ms: u64) {}

    fn flash_timer(&self, _duration_ms: u64) {}
}

/// Delivers the authorization verdict. `FnOnce` makes a second call
/// impossible.
pub type AuthorizationCallback = Box<dyn FnOnce(bool)>;

/// Payment authorization, supplied by the embedder.
///
/// Implementations must eventually call `on_result`. There is no timeout:
/// a request that never resolves leaves the widget in its pending state.
pub trait Authorizer {
    fn request(&self, request: CommitRequest, on_result: AuthorizationCallback);
}

impl<F> Authorizer for F
where
    F: Fn(CommitRequest, AuthorizationCallback),
{
    fn request(&self, request: CommitRequest, on_result: AuthorizationCallback) {
        self(request, on_result)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeedback;

impl Feedback for NoFeedback {}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoSurface;

impl WheelSurface for NoSurface {}

/// Answers every request synchronously with a fixed verdict.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedAuthorizer {
    approve: bool,
}

impl ScriptedAuthorizer {
    pub fn approving() -> Self {
        Self { approve: true }
    }

    pub fn declining() -> Self {
        Self { approve: false }
    }
}

impl Authorizer for ScriptedAuthorizer {
    fn request(&self, request: CommitRequest, on_result: AuthorizationCallback) {
        tracing::debug!(minutes = request.minutes, approve = self.approve, "scripted authorization");
        on_result(self.approve);
    }
}

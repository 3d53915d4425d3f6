use std::cell::RefCell;
use std::rc::Rc;

use lightvts::{LightService, LightState, LightType, Status, TransportError};

pub type Reply = fn(LightType, &LightState, bool) -> Status;

/// Answers according to `reply`, which gets told whether the type was
/// advertised. Can be told to drop the connection after some calls.
pub struct ScriptedLight {
    pub supported: Vec<LightType>,
    pub reply: Reply,
    pub fail_after: Option<usize>,
    pub calls: Rc<RefCell<Vec<(LightType, LightState)>>>,
}

impl ScriptedLight {
    pub fn new(supported: &[LightType], reply: Reply) -> ScriptedLight {
        ScriptedLight {
            supported: supported.to_vec(),
            reply,
            fail_after: None,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl LightService for ScriptedLight {
    fn is_remote(&self) -> bool {
        false
    }

    fn get_supported_types(&mut self) -> Result<Vec<LightType>, TransportError> {
        Ok(self.supported.clone())
    }

    fn set_light(&mut self, light_type: LightType, state: &LightState) -> Result<Status, TransportError> {
        let mut calls = self.calls.borrow_mut();
        if let Some(limit) = self.fail_after {
            if calls.len() >= limit {
                return Err(TransportError::Disconnected);
            }
        }
        calls.push((light_type, *state));
        Ok((self.reply)(light_type, state, self.supported.contains(&light_type)))
    }
}

/// What a well behaved service answers.
pub fn conforming(_: LightType, _: &LightState, supported: bool) -> Status {
    if supported {
        Status::Success
    } else {
        Status::LightNotSupported
    }
}

/// Accepts everything, advertised or not.
pub fn accepts_everything(_: LightType, _: &LightState, _: bool) -> Status {
    Status::Success
}

/// Reports a generic failure instead of BRIGHTNESS_NOT_SUPPORTED.
pub fn unknown_on_low_persistence(_: LightType, state: &LightState, supported: bool) -> Status {
    if !supported {
        return Status::LightNotSupported;
    }
    if state.brightness_mode == lightvts::Brightness::LowPersistence {
        return Status::Unknown;
    }
    Status::Success
}

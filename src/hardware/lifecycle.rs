// Host-side lifecycle for one hardware system
//
// Tracks the managed state and only forwards a callback when the transition
// is legal from the current state. A failing callback leaves the state as it
// was.

use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::error::HardwareError;
use super::info::HardwareInfo;
use super::interface::{CallbackReturn, ReturnType, SystemInterface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

pub struct HardwareComponent<S: SystemInterface> {
    name: String,
    system: S,
    state: LifecycleState,
}

impl<S: SystemInterface> HardwareComponent<S> {
    /// Initialize the system from its description; the component starts unconfigured
    pub fn init(mut system: S, info: &HardwareInfo) -> Result<Self, HardwareError> {
        let result = system.on_init(info);
        info!(
            "Hardware '{}' init: {:?}",
            info.name,
            CallbackReturn::from(&result)
        );
        result?;
        Ok(Self {
            name: info.name.clone(),
            system,
            state: LifecycleState::Unconfigured,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut S {
        &mut self.system
    }

    fn transition(
        &mut self,
        transition: &'static str,
        allowed: &[LifecycleState],
        target: LifecycleState,
        callback: fn(&mut S) -> Result<(), HardwareError>,
    ) -> Result<(), HardwareError> {
        if !allowed.contains(&self.state) {
            warn!("Hardware '{}': cannot {} while {:?}", self.name, transition, self.state);
            return Err(HardwareError::InvalidTransition {
                transition,
                state: self.state,
            });
        }

        let result = callback(&mut self.system);
        info!(
            "Hardware '{}' {}: {:?}",
            self.name,
            transition,
            CallbackReturn::from(&result)
        );
        result?;
        self.state = target;
        Ok(())
    }

    pub fn configure(&mut self) -> Result<(), HardwareError> {
        use LifecycleState::*;
        self.transition("configure", &[Unconfigured, Inactive], Inactive, S::on_configure)
    }

    pub fn activate(&mut self) -> Result<(), HardwareError> {
        use LifecycleState::*;
        self.transition("activate", &[Inactive], Active, S::on_activate)
    }

    pub fn deactivate(&mut self) -> Result<(), HardwareError> {
        use LifecycleState::*;
        self.transition("deactivate", &[Active], Inactive, S::on_deactivate)
    }

    pub fn cleanup(&mut self) -> Result<(), HardwareError> {
        use LifecycleState::*;
        self.transition("cleanup", &[Inactive], Unconfigured, S::on_cleanup)
    }

    /// Walk down to `Finalized` from any state, running deactivate and cleanup on the way
    ///
    /// The component is finalized even if a callback fails; the first error is returned.
    pub fn shutdown(&mut self) -> Result<(), HardwareError> {
        let mut first_err = None;

        if self.state == LifecycleState::Active {
            if let Err(e) = self.system.on_deactivate() {
                first_err.get_or_insert(e);
            }
            self.state = LifecycleState::Inactive;
        }
        if self.state == LifecycleState::Inactive {
            if let Err(e) = self.system.on_cleanup() {
                first_err.get_or_insert(e);
            }
        }

        self.state = LifecycleState::Finalized;
        info!("Hardware '{}' finalized", self.name);
        first_err.map_or(Ok(()), Err)
    }

    /// One control tick: read then write, only while active
    ///
    /// Write runs even when read fails so setpoints keep reaching the motors
    /// that still answer. The first error is reported.
    pub fn tick(&mut self, time: Instant, period: Duration) -> ReturnType {
        if self.state != LifecycleState::Active {
            return ReturnType::Ok;
        }

        let read = self.system.read(time, period);
        if let Err(e) = &read {
            warn!("Hardware '{}' read failed: {}", self.name, e);
        }
        let write = self.system.write(time, period);
        if let Err(e) = &write {
            warn!("Hardware '{}' write failed: {}", self.name, e);
        }
        ReturnType::from(&read.and(write))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::interface::{CommandInterface, StateInterface};
    use std::collections::HashMap;

    /// Records callbacks; fails any callback whose name is in `fail`
    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        fail: Vec<&'static str>,
    }

    impl Recorder {
        fn record(&mut self, name: &'static str) -> Result<(), HardwareError> {
            self.calls.push(name);
            if self.fail.contains(&name) {
                Err(HardwareError::NotConnected)
            } else {
                Ok(())
            }
        }
    }

    impl SystemInterface for Recorder {
        fn on_init(&mut self, _info: &HardwareInfo) -> Result<(), HardwareError> {
            self.record("init")
        }
        fn on_configure(&mut self) -> Result<(), HardwareError> {
            self.record("configure")
        }
        fn on_cleanup(&mut self) -> Result<(), HardwareError> {
            self.record("cleanup")
        }
        fn on_activate(&mut self) -> Result<(), HardwareError> {
            self.record("activate")
        }
        fn on_deactivate(&mut self) -> Result<(), HardwareError> {
            self.record("deactivate")
        }
        fn export_state_interfaces(&self) -> Vec<StateInterface> {
            Vec::new()
        }
        fn export_command_interfaces(&self) -> Vec<CommandInterface> {
            Vec::new()
        }
        fn set_command(&mut self, _: &str, _: &str, _: f64) -> Result<(), HardwareError> {
            Ok(())
        }
        fn read(&mut self, _: Instant, _: Duration) -> Result<(), HardwareError> {
            self.record("read")
        }
        fn write(&mut self, _: Instant, _: Duration) -> Result<(), HardwareError> {
            self.record("write")
        }
    }

    fn info() -> HardwareInfo {
        HardwareInfo {
            name: "DiffBot".to_string(),
            hardware_parameters: HashMap::new(),
            joints: Vec::new(),
        }
    }

    fn component(fail: &[&'static str]) -> HardwareComponent<Recorder> {
        let recorder = Recorder {
            fail: fail.to_vec(),
            ..Recorder::default()
        };
        HardwareComponent::init(recorder, &info()).unwrap()
    }

    fn tick(c: &mut HardwareComponent<Recorder>) -> ReturnType {
        c.tick(Instant::now(), Duration::from_millis(20))
    }

    #[test]
    fn test_full_lifecycle() {
        let mut c = component(&[]);
        assert_eq!(c.state(), LifecycleState::Unconfigured);
        c.configure().unwrap();
        assert_eq!(c.state(), LifecycleState::Inactive);
        c.activate().unwrap();
        assert_eq!(c.state(), LifecycleState::Active);
        assert_eq!(tick(&mut c), ReturnType::Ok);
        c.deactivate().unwrap();
        c.activate().unwrap();
        c.deactivate().unwrap();
        c.cleanup().unwrap();
        assert_eq!(c.state(), LifecycleState::Unconfigured);

        assert_eq!(
            c.system().calls,
            [
                "init", "configure", "activate", "read", "write", "deactivate", "activate",
                "deactivate", "cleanup"
            ]
        );
    }

    #[test]
    fn test_init_failure_is_reported() {
        let recorder = Recorder {
            fail: vec!["init"],
            ..Recorder::default()
        };
        assert!(HardwareComponent::init(recorder, &info()).is_err());
    }

    #[test]
    fn test_configure_twice_stays_inactive() {
        let mut c = component(&[]);
        c.configure().unwrap();
        c.configure().unwrap();
        assert_eq!(c.state(), LifecycleState::Inactive);
    }

    #[test]
    fn test_activate_before_configure_is_rejected() {
        let mut c = component(&[]);
        assert!(matches!(
            c.activate(),
            Err(HardwareError::InvalidTransition {
                transition: "activate",
                state: LifecycleState::Unconfigured
            })
        ));
        assert_eq!(c.system().calls, ["init"]);
    }

    #[test]
    fn test_failed_callback_keeps_state() {
        let mut c = component(&["activate"]);
        c.configure().unwrap();
        assert!(c.activate().is_err());
        assert_eq!(c.state(), LifecycleState::Inactive);
    }

    #[test]
    fn test_tick_only_runs_while_active() {
        let mut c = component(&[]);
        assert_eq!(tick(&mut c), ReturnType::Ok);
        c.configure().unwrap();
        assert_eq!(tick(&mut c), ReturnType::Ok);
        assert!(!c.system().calls.contains(&"read"));
    }

    #[test]
    fn test_failed_read_still_writes() {
        let mut c = component(&["read"]);
        c.configure().unwrap();
        c.activate().unwrap();
        assert_eq!(tick(&mut c), ReturnType::Error);
        assert!(c.system().calls.ends_with(&["read", "write"]));
        assert_eq!(c.state(), LifecycleState::Active);
    }

    #[test]
    fn test_failed_write_reports_error() {
        let mut c = component(&["write"]);
        c.configure().unwrap();
        c.activate().unwrap();
        assert_eq!(tick(&mut c), ReturnType::Error);
    }

    #[test]
    fn test_shutdown_from_active() {
        let mut c = component(&["deactivate"]);
        c.configure().unwrap();
        c.activate().unwrap();
        assert!(c.shutdown().is_err());
        assert_eq!(c.state(), LifecycleState::Finalized);
        assert!(c.system().calls.ends_with(&["deactivate", "cleanup"]));
        assert!(c.configure().is_err());
    }
}

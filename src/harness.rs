use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::light_api::{LightState, LightType, Status, ALL_TYPES, LOW_PERSISTENCE, OFF, WHITE};
use crate::service::{LightService, ServiceLocator, TransportError};

pub const SUITE_NAME: &str = "LightTest";

/// Per-case setup: a fresh service handle and the types it advertises.
pub struct Fixture<S> {
    pub light: S,
    pub supported_types: BTreeSet<LightType>,
}

impl<S: LightService> Fixture<S> {
    pub fn set_up<L>(locator: &L, service_name: &str) -> Result<Fixture<S>, TransportError>
    where
        L: ServiceLocator<Service = S>,
    {
        let mut light = locator.get_service(service_name)?;
        info!("Test is remote {}", light.is_remote());
        let supported_types = light.get_supported_types()?.into_iter().collect();
        return Ok(Fixture {
            light,
            supported_types,
        });
    }

    /// Known types the service did not advertise.
    pub fn unsupported_types(&self) -> BTreeSet<LightType> {
        return unsupported_types(&self.supported_types);
    }
}

pub fn unsupported_types(supported: &BTreeSet<LightType>) -> BTreeSet<LightType> {
    return ALL_TYPES
        .iter()
        .copied()
        .filter(|t| !supported.contains(t))
        .collect();
}

/// Collects non-fatal contract violations. Transport failures are not
/// recorded here, they end the case through `?` instead.
#[derive(Default, Debug)]
pub struct Checks {
    failures: Vec<String>,
}

impl Checks {
    pub fn expect_one_of(&mut self, call: &dyn fmt::Display, allowed: &[Status], actual: Status) {
        if allowed.contains(&actual) {
            return;
        }
        let expected: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
        let failure = format!("{}: expected {}, got {}", call, expected.join(" or "), actual);
        warn!("{}", failure);
        self.failures.push(failure);
    }

    pub fn failures(&self) -> &[String] {
        return &self.failures;
    }
}

struct SetLightCall<'a> {
    light_type: LightType,
    state_name: &'a str,
}

impl<'a> fmt::Display for SetLightCall<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        return write!(f, "set_light({}, {})", self.light_type, self.state_name);
    }
}

/// Drives every type in `types` into `state` and checks the status of each call.
fn drive<S: LightService>(
    light: &mut S,
    checks: &mut Checks,
    types: &BTreeSet<LightType>,
    state_name: &str,
    state: &LightState,
    allowed: &[Status],
) -> Result<(), TransportError> {
    for &light_type in types {
        let status = light.set_light(light_type, state)?;
        let call = SetLightCall {
            light_type,
            state_name,
        };
        checks.expect_one_of(&call, allowed, status);
    }
    return Ok(());
}

/// Every light reported as supported can be switched on and off.
pub fn test_supported<S: LightService>(fixture: &mut Fixture<S>, checks: &mut Checks) -> Result<(), TransportError> {
    let supported = fixture.supported_types.clone();
    drive(&mut fixture.light, checks, &supported, "WHITE", &WHITE, &[Status::Success])?;
    drive(&mut fixture.light, checks, &supported, "OFF", &OFF, &[Status::Success])?;
    return Ok(());
}

/// Low persistence is optional, but a service lacking it must say so.
pub fn test_low_persistence<S: LightService>(
    fixture: &mut Fixture<S>,
    checks: &mut Checks,
) -> Result<(), TransportError> {
    let supported = fixture.supported_types.clone();
    drive(
        &mut fixture.light,
        checks,
        &supported,
        "LOW_PERSISTENCE",
        &LOW_PERSISTENCE,
        &[Status::Success, Status::BrightnessNotSupported],
    )?;
    drive(&mut fixture.light, checks, &supported, "OFF", &OFF, &[Status::Success])?;
    return Ok(());
}

/// Lights which are not advertised must be refused.
pub fn test_unsupported<S: LightService>(
    fixture: &mut Fixture<S>,
    checks: &mut Checks,
) -> Result<(), TransportError> {
    let unsupported = fixture.unsupported_types();
    drive(
        &mut fixture.light,
        checks,
        &unsupported,
        "WHITE",
        &WHITE,
        &[Status::LightNotSupported],
    )?;
    return Ok(());
}

pub type CaseFn<S> = fn(&mut Fixture<S>, &mut Checks) -> Result<(), TransportError>;

pub struct TestCase<S> {
    pub name: &'static str,
    pub run: CaseFn<S>,
}

impl<S> TestCase<S> {
    pub fn full_name(&self) -> String {
        return format!("{}.{}", SUITE_NAME, self.name);
    }
}

pub fn test_cases<S: LightService>() -> Vec<TestCase<S>> {
    return vec![
        TestCase {
            name: "TestSupported",
            run: test_supported::<S>,
        },
        TestCase {
            name: "TestLowPersistence",
            run: test_low_persistence::<S>,
        },
        TestCase {
            name: "TestUnsupported",
            run: test_unsupported::<S>,
        },
    ];
}

#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub failures: Vec<String>,
    /// Set when a transport failure cut the case short.
    pub fatal: Option<String>,
    pub elapsed: Duration,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        return self.failures.is_empty() && self.fatal.is_none();
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        return self.cases.iter().all(CaseReport::passed);
    }

    pub fn failed_cases(&self) -> Vec<&str> {
        return self
            .cases
            .iter()
            .filter(|c| !c.passed())
            .map(|c| c.name.as_str())
            .collect();
    }

    pub fn exit_code(&self) -> i32 {
        return if self.passed() { 0 } else { 1 };
    }
}

/// Runs one case against a freshly located service.
pub fn run_case<L: ServiceLocator>(locator: &L, service_name: &str, case: &TestCase<L::Service>) -> CaseReport {
    let start = Instant::now();
    let mut checks = Checks::default();
    let result = Fixture::set_up(locator, service_name)
        .map_err(|e| format!("setup failed: {}", e))
        .and_then(|mut fixture| (case.run)(&mut fixture, &mut checks).map_err(|e| format!("call failed: {}", e)));
    if let Err(e) = &result {
        error!("{}: {}", case.full_name(), e);
    }
    return CaseReport {
        name: case.full_name(),
        failures: checks.failures,
        fatal: result.err(),
        elapsed: start.elapsed(),
    };
}

/// Runs all cases selected by `filter`, printing a per-case report.
pub fn run_suite<L: ServiceLocator>(locator: &L, service_name: &str, filter: &Filter) -> RunReport {
    let cases: Vec<TestCase<L::Service>> = test_cases()
        .into_iter()
        .filter(|c| filter.matches(&c.full_name()))
        .collect();
    println!("[==========] Running {} tests from 1 test suite.", cases.len());
    let mut report = RunReport::default();
    for case in &cases {
        println!("[ RUN      ] {}", case.full_name());
        let case_report = run_case(locator, service_name, case);
        for failure in &case_report.failures {
            println!("Failure: {}", failure);
        }
        if let Some(fatal) = &case_report.fatal {
            println!("Fatal: {}", fatal);
        }
        let tag = if case_report.passed() { "[       OK ]" } else { "[  FAILED  ]" };
        println!("{} {} ({} ms)", tag, case_report.name, case_report.elapsed.as_millis());
        report.cases.push(case_report);
    }
    let passed = report.cases.iter().filter(|c| c.passed()).count();
    println!("[==========] {} tests from 1 test suite ran.", report.cases.len());
    println!("[  PASSED  ] {} tests.", passed);
    for name in report.failed_cases() {
        println!("[  FAILED  ] {}", name);
    }
    return report;
}

/// gtest style name filter: `POSITIVE[-NEGATIVE]`, each a `:` separated
/// list of patterns where `*` and `?` are wildcards.
#[derive(Clone, Debug)]
pub struct Filter {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Filter {
    pub fn parse(spec: &str) -> Filter {
        let (positive, negative) = match spec.split_once('-') {
            Some((pos, neg)) => (pos, neg),
            None => (spec, ""),
        };
        let split = |s: &str| -> Vec<String> {
            s.split(':').filter(|p| !p.is_empty()).map(String::from).collect()
        };
        let mut positive = split(positive);
        if positive.is_empty() {
            positive.push("*".to_string());
        }
        return Filter {
            positive,
            negative: split(negative),
        };
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.as_bytes();
        return self.positive.iter().any(|p| glob_match(p.as_bytes(), name))
            && !self.negative.iter().any(|p| glob_match(p.as_bytes(), name));
    }
}

impl Default for Filter {
    fn default() -> Filter {
        return Filter::parse("*");
    }
}

fn glob_match(pattern: &[u8], name: &[u8]) -> bool {
    return match (pattern.first(), name.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            glob_match(&pattern[1..], name) || (!name.is_empty() && glob_match(pattern, &name[1..]))
        }
        (Some(b'?'), Some(_)) => glob_match(&pattern[1..], &name[1..]),
        (Some(p), Some(n)) if p == n => glob_match(&pattern[1..], &name[1..]),
        _ => false,
    };
}

// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Return codes that always classify a test as [`TestStatus::Crash`](crate::TestStatus::Crash).
///
/// On Unix, a process terminated by a signal is reported with the negated signal number. On
/// Windows, an unhandled structured exception surfaces as its NTSTATUS reinterpreted as a signed
/// 32-bit integer.
///
/// The crash classification overrides whatever the test reported through the embedded result
/// protocol.
pub enum CrashCode {}

impl CrashCode {
    /// SIGTRAP: the process hit a breakpoint or trace trap.
    pub const SIGTRAP: i32 = -5;

    /// SIGABRT: the process called `abort()`, usually through a failed assertion.
    pub const SIGABRT: i32 = -6;

    /// SIGFPE: floating point exception.
    pub const SIGFPE: i32 = -8;

    /// SIGUSR1.
    pub const SIGUSR1: i32 = -10;

    /// SIGSEGV: segmentation fault.
    pub const SIGSEGV: i32 = -11;

    /// `EXCEPTION_ACCESS_VIOLATION` (0xc0000005).
    pub const WINDOWS_ACCESS_VIOLATION: i32 = 0xc000_0005_u32 as i32;

    /// `EXCEPTION_INT_DIVIDE_BY_ZERO` (0xc0000094).
    pub const WINDOWS_INT_DIVIDE_BY_ZERO: i32 = 0xc000_0094_u32 as i32;

    /// All return codes that are classified as crashes.
    pub const ALL: &'static [i32] = &[
        Self::SIGTRAP,
        Self::SIGABRT,
        Self::SIGFPE,
        Self::SIGUSR1,
        Self::SIGSEGV,
        Self::WINDOWS_ACCESS_VIOLATION,
        Self::WINDOWS_INT_DIVIDE_BY_ZERO,
    ];

    /// Returns true if `returncode` indicates that the test process crashed.
    pub fn is_crash(returncode: i32) -> bool {
        Self::ALL.contains(&returncode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(CrashCode::SIGTRAP ; "sigtrap")]
    #[test_case(CrashCode::SIGABRT ; "sigabrt")]
    #[test_case(CrashCode::SIGFPE ; "sigfpe")]
    #[test_case(CrashCode::SIGUSR1 ; "sigusr1")]
    #[test_case(CrashCode::SIGSEGV ; "sigsegv")]
    #[test_case(CrashCode::WINDOWS_ACCESS_VIOLATION ; "windows access violation")]
    #[test_case(CrashCode::WINDOWS_INT_DIVIDE_BY_ZERO ; "windows int divide by zero")]
    fn crash_code_is_crash(code: i32) {
        assert!(CrashCode::is_crash(code), "{code} is a crash");
    }

    #[test]
    fn every_listed_code_is_crash() {
        assert_eq!(CrashCode::ALL.len(), 7);
        for &code in CrashCode::ALL {
            assert!(CrashCode::is_crash(code), "{code} is a crash");
        }
    }

    #[test]
    fn unix_signal_values() {
        assert_eq!(
            [
                CrashCode::SIGTRAP,
                CrashCode::SIGABRT,
                CrashCode::SIGFPE,
                CrashCode::SIGUSR1,
                CrashCode::SIGSEGV,
            ],
            [-5, -6, -8, -10, -11]
        );
    }

    #[test]
    fn windows_codes_are_sign_extended() {
        assert_eq!(CrashCode::WINDOWS_ACCESS_VIOLATION, -1073741819);
        assert_eq!(CrashCode::WINDOWS_INT_DIVIDE_BY_ZERO, -1073741676);
    }

    #[test]
    fn ordinary_codes_are_not_crashes() {
        for code in [0, 1, 2, -9, -15, 139, 255] {
            assert!(!CrashCode::is_crash(code), "{code} is not a crash");
        }
    }
}

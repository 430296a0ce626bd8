use crate::errors::{Error, Result};
use tracing::{error, warn};

/// A resource that must be given back to the OS exactly once.
/// Releasing an already released resource is a no-op.
pub trait Release {
    fn release(&mut self) -> Result<()>;
}

/// Releases the resource if the scope is left without an explicit release,
/// which only happens while unwinding.
struct Guard<R: Release> {
    resource: R,
    armed: bool,
}

impl<R: Release> Guard<R> {
    fn release(mut self) -> Result<()> {
        self.armed = false;
        self.resource.release()
    }
}

impl<R: Release> Drop for Guard<R> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.resource.release() {
                error!("failed to release resource while unwinding: {}", e);
            }
        }
    }
}

/// Runs `f` against `resource` and releases it on every exit path.
///
/// A release failure takes precedence over whatever `f` returned: if both fail, the
/// caller sees the release error and the error from `f` is only logged.
pub fn bracket<R, T, E, F>(resource: R, f: F) -> std::result::Result<T, E>
where
    R: Release,
    E: From<Error> + std::fmt::Display,
    F: FnOnce(&mut R) -> std::result::Result<T, E>,
{
    let mut guard = Guard {
        resource,
        armed: true,
    };
    let outcome = f(&mut guard.resource);
    match (guard.release(), outcome) {
        (Ok(()), outcome) => outcome,
        (Err(release_err), Err(masked)) => {
            warn!("release failed ({}), masking scope error: {}", release_err, masked);
            Err(E::from(release_err))
        }
        (Err(release_err), Ok(_)) => Err(E::from(release_err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    struct Counted<'a> {
        releases: &'a Cell<usize>,
        fail: bool,
    }

    impl Release for Counted<'_> {
        fn release(&mut self) -> Result<()> {
            self.releases.set(self.releases.get() + 1);
            if self.fail {
                return Err(Error::Close(io::Error::from_raw_os_error(libc::EIO)));
            }
            Ok(())
        }
    }

    #[test]
    fn test_releases_after_success() {
        let releases = Cell::new(0);
        let resource = Counted {
            releases: &releases,
            fail: false,
        };

        let value: Result<u32> = bracket(resource, |_| Ok(7));
        assert_eq!(value.unwrap(), 7);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_scope_error_propagates_after_release() {
        let releases = Cell::new(0);
        let resource = Counted {
            releases: &releases,
            fail: false,
        };

        let value: Result<()> = bracket(resource, |_| {
            Err(Error::Read(io::Error::from(io::ErrorKind::UnexpectedEof)))
        });
        assert!(matches!(value, Err(Error::Read(_))));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_release_error_supersedes_scope_error() {
        let releases = Cell::new(0);
        let resource = Counted {
            releases: &releases,
            fail: true,
        };

        let value: Result<()> = bracket(resource, |_| {
            Err(Error::Read(io::Error::from(io::ErrorKind::UnexpectedEof)))
        });
        match value {
            Err(Error::Close(err)) => assert_eq!(err.raw_os_error(), Some(libc::EIO)),
            other => panic!("expected close error, got {:?}", other),
        }
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_release_error_replaces_success() {
        let releases = Cell::new(0);
        let resource = Counted {
            releases: &releases,
            fail: true,
        };

        let value: Result<u32> = bracket(resource, |_| Ok(1));
        assert!(matches!(value, Err(Error::Close(_))));
    }

    #[test]
    fn test_releases_on_unwind() {
        let releases = Cell::new(0);
        let resource = Counted {
            releases: &releases,
            fail: false,
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _: Result<()> = bracket(resource, |_| panic!("boom"));
        }));
        assert!(outcome.is_err());
        assert_eq!(releases.get(), 1);
    }

    #[derive(Debug)]
    enum AppError {
        Stream(Error),
        Parse(String),
    }

    impl From<Error> for AppError {
        fn from(e: Error) -> Self {
            AppError::Stream(e)
        }
    }

    impl std::fmt::Display for AppError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                AppError::Stream(e) => write!(f, "{}", e),
                AppError::Parse(msg) => write!(f, "parse: {}", msg),
            }
        }
    }

    #[test]
    fn test_caller_error_type_is_preserved() {
        let releases = Cell::new(0);
        let resource = Counted {
            releases: &releases,
            fail: false,
        };

        let value: std::result::Result<(), AppError> =
            bracket(resource, |_| Err(AppError::Parse("bad header".to_string())));
        assert!(matches!(value, Err(AppError::Parse(msg)) if msg == "bad header"));

        let failing = Counted {
            releases: &releases,
            fail: true,
        };
        let value: std::result::Result<(), AppError> =
            bracket(failing, |_| Err(AppError::Parse("bad header".to_string())));
        assert!(matches!(value, Err(AppError::Stream(Error::Close(_)))));
        assert_eq!(releases.get(), 2);
    }
}

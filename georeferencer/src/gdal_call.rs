//! Checks for the handful of GDAL C calls the `gdal` crate does not wrap.

use std::ffi::CStr;

use gdal_sys::CPLErr;

#[derive(thiserror::Error, Debug)]
#[error("{call} failed: {msg}")]
pub struct GdalCallError {
    pub call: &'static str,
    pub msg: String,
}

pub fn last_error_message() -> String {
    let msg = unsafe { gdal_sys::CPLGetLastErrorMsg() };
    if msg.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

pub fn check_rc(rv: CPLErr::Type, call: &'static str) -> Result<(), GdalCallError> {
    if rv != CPLErr::CE_None {
        return Err(GdalCallError {
            call,
            msg: last_error_message(),
        });
    }
    Ok(())
}

pub fn check_pointer<T>(ptr: *mut T, call: &'static str) -> Result<*mut T, GdalCallError> {
    if ptr.is_null() {
        return Err(GdalCallError {
            call,
            msg: last_error_message(),
        });
    }
    Ok(ptr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes_through() {
        assert!(check_rc(CPLErr::CE_None, "GDALNothing").is_ok());
    }

    #[test]
    fn failure_names_the_call() {
        let err = check_rc(CPLErr::CE_Failure, "GDALSetGCPs2").expect_err("failure");

        assert_eq!(err.call, "GDALSetGCPs2");
        assert!(err.to_string().starts_with("GDALSetGCPs2 failed"));
    }

    #[test]
    fn null_pointer_is_an_error() {
        let ptr: *mut u8 = std::ptr::null_mut();

        assert!(check_pointer(ptr, "GDALCreateWarpOptions").is_err());
    }
}

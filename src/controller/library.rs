//! Controllers compiled into dynamic libraries.
//!
//! A controller library is a `cdylib` that exports
//! [`CONTROLLER_ENTRY_SYMBOL`](crate::constants::CONTROLLER_ENTRY_SYMBOL), a
//! function returning a pointer to a [`ControllerModuleV1`] table. Everything
//! crossing the boundary is UTF-8 JSON in NUL-terminated strings owned by the
//! library and released through `free_string`:
//!
//! - `describe()` returns the [`TypeDescriptor`]
//! - `create(&mut error)` returns an opaque instance, or null with an error message
//! - `call(instance, method, args)` returns `{"ok": null | [[key, value], ...]}`
//!   or `{"error": "message"}`; `instance` is null for static methods
//! - `destroy(instance)` drops an instance
//!
//! The library file for `com.example.Greeting` under a classpath root is
//! `<root>/com/example/<platform file name for "Greeting">`, for example
//! `libGreeting.so` on Linux.

use anyhow::{Context, Result, anyhow, bail};
use libloading::{Library, Symbol};
use serde::Deserialize;
use std::ffi::{CStr, CString, c_char, c_void};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::descriptor::TypeDescriptor;
use super::value::{Argument, ResultMap};
use super::{ControllerObject, ControllerType};
use crate::constants::{CONTROLLER_ABI_VERSION, CONTROLLER_ENTRY_SYMBOL};

/// Function table exported by a controller library.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ControllerModuleV1 {
    pub api_version: u32,
    pub describe: unsafe extern "C" fn() -> *mut c_char,
    pub create: unsafe extern "C" fn(error: *mut *mut c_char) -> *mut c_void,
    pub call: unsafe extern "C" fn(
        instance: *mut c_void,
        method: *const c_char,
        args_json: *const c_char,
    ) -> *mut c_char,
    pub destroy: unsafe extern "C" fn(instance: *mut c_void),
    pub free_string: unsafe extern "C" fn(value: *mut c_char),
}

/// Signature of the exported entry point.
pub type ControllerEntry = unsafe extern "C" fn() -> *const ControllerModuleV1;

/// Path of the library that would provide `type_name` under `root`.
#[must_use]
pub fn library_path(root: &Path, type_name: &str) -> PathBuf {
    let mut parts: Vec<&str> = type_name.split('.').collect();
    let simple = parts.pop().unwrap_or(type_name);
    let mut path = root.to_path_buf();
    path.extend(parts);
    path.push(libloading::library_filename(simple));
    path
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum CallResponse {
    Ok(Option<ResultMap>),
    Error(String),
}

/// A controller type backed by a loaded library.
pub struct LibraryType {
    descriptor: TypeDescriptor,
    module: ControllerModuleV1,
    path: PathBuf,
    // Keeps the module table and every instance valid.
    lib: Arc<Library>,
}

impl LibraryType {
    /// Load the library at `path` and check that it describes `type_name`.
    pub fn load(path: &Path, type_name: &str) -> Result<Self> {
        // SAFETY: Loading a controller library runs its initializers; controllers are trusted.
        let lib = unsafe { Library::new(path) }
            .with_context(|| format!("failed to load controller library {}", path.display()))?;

        // SAFETY: Symbol type matches the controller ABI; the table is validated below.
        let module_ptr = unsafe {
            let entry: Symbol<ControllerEntry> =
                lib.get(CONTROLLER_ENTRY_SYMBOL.as_bytes()).with_context(|| {
                    format!(
                        "missing entry symbol `{CONTROLLER_ENTRY_SYMBOL}` in {}",
                        path.display()
                    )
                })?;
            (*entry)()
        };
        if module_ptr.is_null() {
            bail!("{} returned a null controller module", path.display());
        }
        // SAFETY: Pointer comes from the entry point and stays valid while the library is loaded.
        let module = unsafe { *module_ptr };
        if module.api_version != CONTROLLER_ABI_VERSION {
            bail!(
                "controller ABI version mismatch in {}: library={}, host={}",
                path.display(),
                module.api_version,
                CONTROLLER_ABI_VERSION
            );
        }

        // SAFETY: `describe` is part of the validated module table.
        let raw = unsafe { (module.describe)() };
        let json = take_string(&module, raw).context("describe() returned null")?;
        let descriptor: TypeDescriptor = serde_json::from_str(&json)
            .with_context(|| format!("invalid controller descriptor in {}", path.display()))?;
        if descriptor.name != type_name {
            bail!(
                "{} describes {} instead of {type_name}",
                path.display(),
                descriptor.name
            );
        }

        tracing::debug!(
            "Loaded controller library {} ({} methods)",
            path.display(),
            descriptor.methods.len()
        );
        Ok(Self {
            descriptor,
            module,
            path: path.to_path_buf(),
            lib: Arc::new(lib),
        })
    }

    /// Location of the loaded library.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ControllerType for LibraryType {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn instantiate(&self) -> Result<Box<dyn ControllerObject>> {
        let mut error: *mut c_char = std::ptr::null_mut();
        // SAFETY: `create` is part of the validated module table; `error` outlives the call.
        let instance = unsafe { (self.module.create)(&mut error) };
        if instance.is_null() {
            let reason = take_string(&self.module, error)
                .unwrap_or_else(|| "constructor returned null".to_string());
            return Err(anyhow!(reason));
        }
        Ok(Box::new(LibraryInstance {
            instance,
            module: self.module,
            _lib: Arc::clone(&self.lib),
        }))
    }

    fn call_static(&self, method: &str, args: &[Argument]) -> Result<Option<ResultMap>> {
        call(&self.module, std::ptr::null_mut(), method, args)
    }
}

struct LibraryInstance {
    instance: *mut c_void,
    module: ControllerModuleV1,
    _lib: Arc<Library>,
}

impl ControllerObject for LibraryInstance {
    fn call(&mut self, method: &str, args: &[Argument]) -> Result<Option<ResultMap>> {
        call(&self.module, self.instance, method, args)
    }
}

impl Drop for LibraryInstance {
    fn drop(&mut self) {
        // SAFETY: The instance was created by this module and is destroyed exactly once.
        unsafe { (self.module.destroy)(self.instance) };
    }
}

fn call(
    module: &ControllerModuleV1,
    instance: *mut c_void,
    method: &str,
    args: &[Argument],
) -> Result<Option<ResultMap>> {
    let method_c = CString::new(method).context("method name contains a NUL byte")?;
    let args_c = CString::new(serde_json::to_string(args)?)
        .context("arguments contain a NUL byte")?;

    // SAFETY: Both strings outlive the call; the library returns an owned string or null.
    let raw = unsafe { (module.call)(instance, method_c.as_ptr(), args_c.as_ptr()) };
    let json = take_string(module, raw).ok_or_else(|| anyhow!("{method} returned no response"))?;

    match serde_json::from_str::<CallResponse>(&json)
        .with_context(|| format!("malformed response from {method}: {json}"))?
    {
        CallResponse::Ok(result) => Ok(result),
        CallResponse::Error(message) => Err(anyhow!(message)),
    }
}

/// Copy a library-owned string and hand it back to the library.
fn take_string(module: &ControllerModuleV1, raw: *mut c_char) -> Option<String> {
    if raw.is_null() {
        return None;
    }
    // SAFETY: Non-null strings returned by the module are NUL-terminated and owned by it.
    let value = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
    // SAFETY: Returned to the allocator that produced it, once.
    unsafe { (module.free_string)(raw) };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_library_path_follows_package_layout() {
        let path = library_path(Path::new("/out"), "com.example.Greeting");
        let expected = Path::new("/out/com/example").join(libloading::library_filename("Greeting"));
        assert_eq!(path, expected);

        let top_level = library_path(Path::new("/out"), "Greeting");
        assert_eq!(top_level, Path::new("/out").join(libloading::library_filename("Greeting")));
    }

    #[test]
    fn test_call_response_shapes() {
        let ok: CallResponse = serde_json::from_str(r#"{"ok": [["name", "World"]]}"#).unwrap();
        assert!(matches!(ok, CallResponse::Ok(Some(map)) if map.len() == 1));

        let null: CallResponse = serde_json::from_str(r#"{"ok": null}"#).unwrap();
        assert!(matches!(null, CallResponse::Ok(None)));

        let err: CallResponse = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
        assert!(matches!(err, CallResponse::Error(msg) if msg == "boom"));
    }

    #[test]
    fn test_load_rejects_non_library_file() {
        let temp = TempDir::new().unwrap();
        let path = library_path(temp.path(), "com.example.Greeting");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"definitely not a shared object").unwrap();

        let err = LibraryType::load(&path, "com.example.Greeting").err().unwrap();
        assert!(err.to_string().contains("failed to load controller library"));
    }
}

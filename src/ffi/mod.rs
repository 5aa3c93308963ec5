//! Foreign Function Interface for fiona-emu.
//!
//! C-callable entry points so an ISA simulator written in C or C++ can hand
//! its custom-opcode instructions to the coprocessor.
//!
//! # Safety
//! All functions in this module use the `extern "C"` ABI and must be called
//! with valid pointers. Null pointer checks are performed where
//! appropriate.
//!
//! # Memory Management
//! - Handles returned by `fiona_emu_create` must be freed with
//!   `fiona_emu_destroy`.
//! - Host memory is never owned here; every load and store goes through the
//!   caller's callbacks for the duration of one `fiona_emu_execute` call.

use std::ffi::{c_char, c_void, CStr};
use std::sync::Mutex;

use crate::backend::IdealNumerical;
use crate::config::Config;
use crate::interpreter::core::Coprocessor;
use crate::interpreter::decode::{Opcode, RoccInstruction};
use crate::interpreter::traits::{ExecuteError, Memory, MemoryError};

/// Opaque handle to one coprocessor instance.
pub struct FionaEmuHandle {
    cop: Coprocessor<IdealNumerical>,
}

/// Result codes for FFI operations.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FionaEmuResult {
    Success = 0,
    InvalidHandle = 1,
    NullPointer = 2,
    /// The host should raise an illegal-instruction exception.
    IllegalInstruction = 3,
    MemoryFault = 4,
    BackendError = 5,
}

impl From<&ExecuteError> for FionaEmuResult {
    fn from(err: &ExecuteError) -> Self {
        match err {
            ExecuteError::Memory(_) => Self::MemoryFault,
            ExecuteError::Backend(_) => Self::BackendError,
            _ => Self::IllegalInstruction,
        }
    }
}

/// Load one 16-bit element. Returns 0 on success.
pub type FionaLoadFn = unsafe extern "C" fn(ctx: *mut c_void, address: u64, value: *mut i16) -> i32;

/// Store one 16-bit element. Returns 0 on success.
pub type FionaStoreFn = unsafe extern "C" fn(ctx: *mut c_void, address: u64, value: i16) -> i32;

/// Host memory access callbacks.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FionaMemoryCallbacks {
    /// Passed back unchanged to every callback.
    pub ctx: *mut c_void,
    pub load: Option<FionaLoadFn>,
    pub store: Option<FionaStoreFn>,
}

/// Adapts C callbacks to [`Memory`]. A missing callback or non-zero status
/// is an access fault.
struct CallbackMemory<'a> {
    callbacks: Option<&'a FionaMemoryCallbacks>,
}

impl Memory for CallbackMemory<'_> {
    fn load_i16(&mut self, address: u64) -> Result<i16, MemoryError> {
        let cb = self.callbacks.ok_or(MemoryError::AccessFault { address })?;
        let load = cb.load.ok_or(MemoryError::AccessFault { address })?;

        let mut value = 0i16;
        // SAFETY: the caller of fiona_emu_execute vouches for the callback
        // and its context pointer.
        let status = unsafe { load(cb.ctx, address, &mut value) };
        if status != 0 {
            return Err(MemoryError::AccessFault { address });
        }
        Ok(value)
    }

    fn store_i16(&mut self, address: u64, value: i16) -> Result<(), MemoryError> {
        let cb = self.callbacks.ok_or(MemoryError::AccessFault { address })?;
        let store = cb.store.ok_or(MemoryError::AccessFault { address })?;

        // SAFETY: as for load.
        let status = unsafe { store(cb.ctx, address, value) };
        if status != 0 {
            return Err(MemoryError::AccessFault { address });
        }
        Ok(())
    }
}

// Global lock for thread safety during initialization
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Create a new coprocessor instance.
///
/// Options come from the global [`Config`].
///
/// # Safety
/// Returns a non-null handle on success, null if the backend fails to
/// initialize. The returned handle must be freed with `fiona_emu_destroy`.
#[no_mangle]
pub unsafe extern "C" fn fiona_emu_create() -> *mut FionaEmuHandle {
    let _lock = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    // Initialize logging if not already done
    let _ = env_logger::try_init();

    let options = Config::get().engine_options();
    match Coprocessor::with_options(IdealNumerical::new(), options) {
        Ok(cop) => Box::into_raw(Box::new(FionaEmuHandle { cop })),
        Err(e) => {
            log::error!("Failed to create coprocessor: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Destroy a coprocessor instance.
///
/// # Safety
/// `handle` must be a valid pointer returned by `fiona_emu_create`,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn fiona_emu_destroy(handle: *mut FionaEmuHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Execute one instruction given its decoded fields.
///
/// `result` receives the value for the host's `rd` register; it may be null
/// if the caller does not need it. `memory` may be null, in which case any
/// memory access faults.
///
/// # Safety
/// - `handle` must be valid
/// - `memory`, if non-null, must point to callbacks valid for this call
/// - `result`, if non-null, must be writable
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn fiona_emu_execute(
    handle: *mut FionaEmuHandle,
    funct: u8,
    rd: u8,
    rs1: u8,
    rs2: u8,
    xs1: u64,
    xs2: u64,
    memory: *const FionaMemoryCallbacks,
    result: *mut u64,
) -> FionaEmuResult {
    if handle.is_null() {
        return FionaEmuResult::InvalidHandle;
    }
    let insn = RoccInstruction::new(Opcode::from_funct(funct), rd, rs1, rs2);
    run(&mut *handle, memory, result, |cop, mem| {
        cop.dispatch(&insn, xs1, xs2, mem)
    })
}

/// Decode and execute a raw 32-bit RoCC instruction word.
///
/// # Safety
/// Same requirements as `fiona_emu_execute`.
#[no_mangle]
pub unsafe extern "C" fn fiona_emu_execute_word(
    handle: *mut FionaEmuHandle,
    word: u32,
    xs1: u64,
    xs2: u64,
    memory: *const FionaMemoryCallbacks,
    result: *mut u64,
) -> FionaEmuResult {
    if handle.is_null() {
        return FionaEmuResult::InvalidHandle;
    }
    run(&mut *handle, memory, result, |cop, mem| {
        cop.execute_word(word, xs1, xs2, mem)
    })
}

unsafe fn run(
    handle: &mut FionaEmuHandle,
    memory: *const FionaMemoryCallbacks,
    result: *mut u64,
    exec: impl FnOnce(&mut Coprocessor<IdealNumerical>, &mut CallbackMemory<'_>) -> Result<u64, ExecuteError>,
) -> FionaEmuResult {
    let mut mem = CallbackMemory {
        callbacks: memory.as_ref(),
    };

    match exec(&mut handle.cop, &mut mem) {
        Ok(value) => {
            if !result.is_null() {
                *result = value;
            }
            FionaEmuResult::Success
        }
        Err(e) => FionaEmuResult::from(&e),
    }
}

/// Print the instruction counters (same as executing DUMP, but uncounted).
///
/// # Safety
/// `handle` must be valid.
#[no_mangle]
pub unsafe extern "C" fn fiona_emu_dump(handle: *const FionaEmuHandle) -> FionaEmuResult {
    if handle.is_null() {
        return FionaEmuResult::InvalidHandle;
    }
    (*handle).cop.dump();
    FionaEmuResult::Success
}

/// Number of times an opcode display name (e.g. `"add"`) was dispatched.
///
/// A null `name` returns the total over all opcodes. An invalid handle
/// returns 0.
///
/// # Safety
/// - `handle` must be valid or null
/// - `name`, if non-null, must be a valid null-terminated C string
#[no_mangle]
pub unsafe extern "C" fn fiona_emu_instruction_count(
    handle: *const FionaEmuHandle,
    name: *const c_char,
) -> u64 {
    if handle.is_null() {
        return 0;
    }
    let counter = (*handle).cop.counter();
    if name.is_null() {
        return counter.total();
    }
    match CStr::from_ptr(name).to_str() {
        Ok(name) => counter.get(name),
        Err(_) => 0,
    }
}

/// Get version information.
#[no_mangle]
pub extern "C" fn fiona_emu_version() -> u32 {
    // Version 0.1.0 = 0x000100
    0x000100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostMemory;
    use crate::interpreter::decode::funct;

    unsafe extern "C" fn host_load(ctx: *mut c_void, address: u64, value: *mut i16) -> i32 {
        let mem = &mut *(ctx as *mut HostMemory);
        match mem.load_i16(address) {
            Ok(v) => {
                *value = v;
                0
            }
            Err(_) => 1,
        }
    }

    unsafe extern "C" fn host_store(ctx: *mut c_void, address: u64, value: i16) -> i32 {
        let mem = &mut *(ctx as *mut HostMemory);
        match mem.store_i16(address, value) {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }

    fn callbacks(mem: &mut HostMemory) -> FionaMemoryCallbacks {
        FionaMemoryCallbacks {
            ctx: mem as *mut HostMemory as *mut c_void,
            load: Some(host_load),
            store: Some(host_store),
        }
    }

    #[test]
    fn test_create_execute_destroy() {
        let mut mem = HostMemory::new();
        mem.write_slice(0x100, &[1, 2, 3, 4]);
        mem.write_slice(0x200, &[5, 6, 7, 8]);
        let cb = callbacks(&mut mem);

        unsafe {
            let h = fiona_emu_create();
            assert!(!h.is_null());

            let mut out = u64::MAX;
            let r = fiona_emu_execute(h, funct::CONFIG, 0, 0, 0, 4, 0, &cb, &mut out);
            assert_eq!(r, FionaEmuResult::Success);
            assert_eq!(out, 0);

            fiona_emu_execute(h, funct::VLD, 1, 0, 0, 0x100, 0, &cb, std::ptr::null_mut());
            fiona_emu_execute(h, funct::VLD, 2, 0, 0, 0x200, 0, &cb, std::ptr::null_mut());

            let r = fiona_emu_execute(h, funct::DOTP, 0, 1, 2, 0, 0, &cb, &mut out);
            assert_eq!(r, FionaEmuResult::Success);
            assert_eq!(out, 70);

            assert_eq!(fiona_emu_instruction_count(h, b"ld\0".as_ptr() as *const c_char), 2);
            assert_eq!(fiona_emu_instruction_count(h, std::ptr::null()), 4);

            fiona_emu_destroy(h);
        }
    }

    #[test]
    fn test_error_codes() {
        unsafe {
            let h = fiona_emu_create();
            assert!(!h.is_null());
            let null_mem = std::ptr::null();

            let r = fiona_emu_execute(h, funct::CONFIG, 0, 0, 0, 33, 0, null_mem, std::ptr::null_mut());
            assert_eq!(r, FionaEmuResult::IllegalInstruction);

            // No memory callbacks: loads fault
            let r = fiona_emu_execute(h, funct::VLD, 1, 0, 0, 0x100, 0, null_mem, std::ptr::null_mut());
            assert_eq!(r, FionaEmuResult::MemoryFault);

            assert_eq!(fiona_emu_dump(h), FionaEmuResult::Success);
            fiona_emu_destroy(h);
        }
    }

    #[test]
    fn test_execute_word() {
        let mut mem = HostMemory::new();
        let cb = callbacks(&mut mem);
        let word = RoccInstruction::new(Opcode::MinMax, 0, 0, 0)
            .with_flags(true, false, false)
            .encode();

        unsafe {
            let h = fiona_emu_create();
            let mut out = 1;
            assert_eq!(
                fiona_emu_execute_word(h, word, 0, 0, &cb, &mut out),
                FionaEmuResult::Success
            );
            assert_eq!(out, 0);

            assert_eq!(
                fiona_emu_execute_word(h, 0x0000_0013, 0, 0, &cb, &mut out),
                FionaEmuResult::IllegalInstruction
            );
            fiona_emu_destroy(h);
        }
    }

    #[test]
    fn test_null_handle() {
        unsafe {
            let r = fiona_emu_execute(
                std::ptr::null_mut(),
                funct::ADD_V,
                0,
                0,
                0,
                0,
                0,
                std::ptr::null(),
                std::ptr::null_mut(),
            );
            assert_eq!(r, FionaEmuResult::InvalidHandle);
            assert_eq!(fiona_emu_dump(std::ptr::null()), FionaEmuResult::InvalidHandle);
            assert_eq!(fiona_emu_instruction_count(std::ptr::null(), std::ptr::null()), 0);
            fiona_emu_destroy(std::ptr::null_mut());
        }
    }
}

// Memory backends for broadcast regions
// Linux regions live in /dev/shm so separate processes can map them by name

use std::alloc::{self, Layout};
use std::fmt::Debug;
use std::io;
use std::ptr::NonNull;
#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::fd::{AsRawFd, IntoRawFd};
#[cfg(target_os = "linux")]
use std::os::unix::fs::OpenOptionsExt;
use tracing::debug;

/// Alignment of every region handed out by a backend.
pub const REGION_ALIGNMENT: usize = 128;

/// Shared memory backend trait for cross-platform memory mapping
pub trait SharedMemoryBackend: Send + Sync + Debug {
    /// Get a pointer to the mapped memory region
    fn as_ptr(&self) -> *mut u8;

    /// Get the size of the mapped region in bytes
    fn size(&self) -> usize;

    /// Get the underlying OS handle
    fn raw_handle(&self) -> RawHandle;
}

/// Platform-specific handle type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawHandle {
    /// Unix file descriptor (Linux)
    Fd(i32),
    /// Process-private heap memory, no OS handle
    Heap,
}

/// Create a new, zero-filled shared memory region of `size` bytes named `name`
/// under /dev/shm. An existing region with the same name is truncated.
#[cfg(target_os = "linux")]
pub fn create_shared_memory(size: usize, name: &str) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(LinuxSharedMemory::create(size, name)?))
}

/// Attach to an existing shared memory region created by another process.
/// The mapping covers the whole file, which must be at least `min_size` bytes.
#[cfg(target_os = "linux")]
pub fn attach_shared_memory(name: &str, min_size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(LinuxSharedMemory::attach(name, min_size)?))
}

/// Remove the /dev/shm entry for `name`. Existing mappings stay valid.
#[cfg(target_os = "linux")]
pub fn unlink_shared_memory(name: &str) -> io::Result<()> {
    std::fs::remove_file(shm_path(name))
}

#[cfg(not(target_os = "linux"))]
pub fn create_shared_memory(_size: usize, _name: &str) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Shared memory only supported on Linux",
    ))
}

#[cfg(not(target_os = "linux"))]
pub fn attach_shared_memory(_name: &str, _min_size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Shared memory only supported on Linux",
    ))
}

#[cfg(not(target_os = "linux"))]
pub fn unlink_shared_memory(_name: &str) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Shared memory only supported on Linux",
    ))
}

#[cfg(target_os = "linux")]
fn shm_path(name: &str) -> String {
    format!("/dev/shm/{}", name)
}

#[cfg(target_os = "linux")]
#[derive(Debug)]
pub struct LinuxSharedMemory {
    ptr: NonNull<u8>,
    size: usize,
    fd: i32,
}

#[cfg(target_os = "linux")]
unsafe impl Send for LinuxSharedMemory {}
#[cfg(target_os = "linux")]
unsafe impl Sync for LinuxSharedMemory {}

#[cfg(target_os = "linux")]
impl LinuxSharedMemory {
    /// Create a new shared memory region using /dev/shm
    pub fn create(size: usize, name: &str) -> io::Result<Self> {
        let path = shm_path(name);

        // Create or truncate the file in /dev/shm
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&path)
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("Failed to create shared memory file at {}: {}", path, e),
                )
            })?;

        // Set size; the new pages read as zero
        if unsafe { libc::ftruncate(file.as_raw_fd(), size as libc::off_t) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let region = Self::map(file.into_raw_fd(), size)?;
        debug!(path = %path, size, "created shared memory region");
        Ok(region)
    }

    /// Open an existing region in /dev/shm
    pub fn attach(name: &str, min_size: usize) -> io::Result<Self> {
        let path = shm_path(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("Failed to open shared memory at {}: {}", path, e),
                )
            })?;

        let size = file.metadata()?.len() as usize;
        if size < min_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Shared memory size too small: expected at least {} bytes, got {}",
                    min_size, size
                ),
            ));
        }

        let region = Self::map(file.into_raw_fd(), size)?;
        debug!(path = %path, size, "attached shared memory region");
        Ok(region)
    }

    fn map(fd: i32, size: usize) -> io::Result<Self> {
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        // mmap returns page-aligned addresses, which covers REGION_ALIGNMENT
        match NonNull::new(ptr as *mut u8) {
            Some(ptr) => Ok(Self { ptr, size, fd }),
            None => {
                unsafe { libc::close(fd) };
                Err(io::Error::new(io::ErrorKind::Other, "mmap returned a null mapping"))
            }
        }
    }
}

#[cfg(target_os = "linux")]
impl Drop for LinuxSharedMemory {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size);
            libc::close(self.fd);
        }
    }
}

#[cfg(target_os = "linux")]
impl SharedMemoryBackend for LinuxSharedMemory {
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn raw_handle(&self) -> RawHandle {
        RawHandle::Fd(self.fd)
    }
}

/// Zero-filled, [`REGION_ALIGNMENT`]-aligned heap memory for regions shared
/// between threads of one process.
#[derive(Debug)]
pub struct HeapMemory {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for HeapMemory {}
unsafe impl Sync for HeapMemory {}

impl HeapMemory {
    pub fn new(size: usize) -> io::Result<Self> {
        let layout = Layout::from_size_align(size.max(1), REGION_ALIGNMENT)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("Failed to allocate {} bytes of heap memory", size),
            )
        })?;
        Ok(Self { ptr, layout })
    }
}

impl Drop for HeapMemory {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl SharedMemoryBackend for HeapMemory {
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.layout.size()
    }

    fn raw_handle(&self) -> RawHandle {
        RawHandle::Heap
    }
}

/// Allocate process-private memory behind the same trait as shared regions.
pub fn create_heap_memory(size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(HeapMemory::new(size)?))
}

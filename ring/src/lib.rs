//! Capacity-1 cyclic mailbox over process-shared semaphores: the classic
//! bounded-buffer producer/consumer, used to pass a turn token around a
//! fixed ring of players. The mailbox lives in shared memory and is
//! operated through raw pointers, so both sides of a fork see one object.

use std::ptr::addr_of_mut;

pub const PLAYERS: usize = 4;
pub const CAPACITY: usize = 1;

#[repr(C)]
pub struct Mailbox {
    slots: [i32; CAPACITY],
    /// Next write index, cyclic.
    write_at: u32,
    /// Next read index, cyclic.
    read_at: u32,
    /// Mutual exclusion over the slot/index fields.
    mutex: libc::sem_t,
    /// Free slots; send blocks while the box is full.
    empty: libc::sem_t,
    /// Occupied slots; receive blocks while the box is empty.
    full: libc::sem_t,
}

/// In-place initialization of a zeroed mailbox. The semaphores are created
/// process-shared so they work across fork.
pub unsafe fn init(b: *mut Mailbox) -> std::io::Result<()> {
    (*b).write_at = 0;
    (*b).read_at = 0;
    for (sem, initial) in [
        (addr_of_mut!((*b).mutex), 1),
        (addr_of_mut!((*b).empty), CAPACITY as u32),
        (addr_of_mut!((*b).full), 0),
    ] {
        if libc::sem_init(sem, 1, initial as libc::c_uint) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Deposit a message, blocking while the box is full.
pub unsafe fn send(b: *mut Mailbox, msg: i32) {
    wait(addr_of_mut!((*b).empty));
    {
        let _section = Section::enter(addr_of_mut!((*b).mutex));
        let at = (*b).write_at as usize;
        (*b).slots[at] = msg;
        (*b).write_at = ((at + 1) % CAPACITY) as u32;
    }
    post(addr_of_mut!((*b).full));
}

/// Take the next message, blocking while the box is empty.
pub unsafe fn receive(b: *mut Mailbox) -> i32 {
    wait(addr_of_mut!((*b).full));
    let msg = {
        let _section = Section::enter(addr_of_mut!((*b).mutex));
        let at = (*b).read_at as usize;
        let msg = (*b).slots[at];
        (*b).read_at = ((at + 1) % CAPACITY) as u32;
        msg
    };
    post(addr_of_mut!((*b).empty));
    msg
}

/// Tear down the three semaphores. Only after every user has exited.
pub unsafe fn destroy(b: *mut Mailbox) {
    libc::sem_destroy(addr_of_mut!((*b).mutex));
    libc::sem_destroy(addr_of_mut!((*b).empty));
    libc::sem_destroy(addr_of_mut!((*b).full));
}

// Critical section over the mailbox mutex; released on every exit path.
struct Section {
    sem: *mut libc::sem_t,
}

impl Section {
    unsafe fn enter(sem: *mut libc::sem_t) -> Self {
        wait(sem);
        Section { sem }
    }
}

impl Drop for Section {
    fn drop(&mut self) {
        unsafe { libc::sem_post(self.sem) };
    }
}

unsafe fn wait(sem: *mut libc::sem_t) {
    loop {
        if libc::sem_wait(sem) == 0 {
            return;
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            panic!("sem_wait: {}", err);
        }
    }
}

unsafe fn post(sem: *mut libc::sem_t) {
    if libc::sem_post(sem) != 0 {
        panic!("sem_post: {}", std::io::Error::last_os_error());
    }
}

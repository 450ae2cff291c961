// Domino table: PLAYERS processes in a ring, one capacity-1 mailbox each.
// The parent seeds a turn token into player 0's mailbox; each player waits
// on its own mailbox, takes its turn, and passes the token counter-
// clockwise. Every player takes ROUNDS turns, then the table winds down.
use libc::*;
use std::ptr;
use std::ptr::addr_of_mut;

use ring::{init, receive, send, destroy, Mailbox, PLAYERS};

const SHM_NAME: &str = "/domino_ring";
const ROUNDS: usize = 3;

#[repr(C)]
struct Table {
    boxes: [Mailbox; PLAYERS],
}

fn player(id: usize, table: *mut Table) {
    let next_id = (id + PLAYERS - 1) % PLAYERS;
    unsafe {
        let own = addr_of_mut!((*table).boxes[id]);
        let next = addr_of_mut!((*table).boxes[next_id]);
        for _ in 0..ROUNDS {
            let token = receive(own);
            println!("player {} takes turn {}", id, token);
            usleep(100_000);
            send(next, token + 1);
        }
    }
}

fn main() {
    unsafe {
        let name = std::ffi::CString::new(SHM_NAME).unwrap();
        let shm_size = std::mem::size_of::<Table>();

        let fd = shm_open(name.as_ptr(), O_CREAT | O_RDWR, 0o666);
        if fd < 0 {
            panic!("shm_open: {}", std::io::Error::last_os_error());
        }
        if ftruncate(fd, shm_size as i64) != 0 {
            panic!("ftruncate: {}", std::io::Error::last_os_error());
        }
        let map = mmap(
            ptr::null_mut(),
            shm_size,
            PROT_READ | PROT_WRITE,
            MAP_SHARED,
            fd,
            0,
        );
        if map == MAP_FAILED {
            panic!("mmap: {}", std::io::Error::last_os_error());
        }
        close(fd);
        let table = map as *mut Table;

        for id in 0..PLAYERS {
            if let Err(e) = init(addr_of_mut!((*table).boxes[id])) {
                panic!("sem_init: {}", e);
            }
        }

        let mut pids = Vec::with_capacity(PLAYERS);
        for id in 0..PLAYERS {
            let pid = fork();
            if pid < 0 {
                panic!("fork: {}", std::io::Error::last_os_error());
            }
            if pid == 0 {
                player(id, table);
                std::process::exit(0);
            }
            pids.push(pid);
        }

        // Deal the first turn to player 0.
        send(addr_of_mut!((*table).boxes[0]), 1);

        for pid in pids {
            let _ = waitpid(pid, ptr::null_mut(), 0);
        }

        for id in 0..PLAYERS {
            destroy(addr_of_mut!((*table).boxes[id]));
        }
        munmap(map, shm_size);
        shm_unlink(name.as_ptr());

        println!("table closed after {} turns", ROUNDS * PLAYERS);
    }
}

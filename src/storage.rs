use std::fs::OpenOptions;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::io;

use quick_error::quick_error;

use crate::bios::BIOS;
use crate::cpu::{CPU, R};
use crate::machine::Component;
use crate::memory::MMU;

#[cfg(test)]
#[path = "./storage_test.rs"]
mod storage_test;

const DEBUG_DISK: bool = false;

pub const SECTOR_SIZE: usize = 512;

/// first fixed disk number; lower drive numbers are floppies
pub const FIRST_HD: u8 = 0x80;

/// int 13h status codes reported in AH
const STATUS_OK: u8 = 0x00;
const STATUS_BAD_COMMAND: u8 = 0x01;
const STATUS_SECTOR_NOT_FOUND: u8 = 0x04;
const STATUS_WRITE_FAULT: u8 = 0xCC;
const STATUS_NO_MEDIA: u8 = 0xAA;

quick_error! {
    #[derive(Debug)]
    pub enum DiskError {
        Io(err: io::Error) {
            from()
            display("io error: {}", err)
        }
        TooSmall {
            display("disk image is smaller than one sector")
        }
    }
}

/// one entry of the disk table: a backing handle plus the geometry
/// derived from its size on insert
pub struct Disk {
    backing: File,

    /// opened from a `\\` path, geometry was queried from the host device
    raw_device: bool,

    /// byte size of the backing image or device
    pub size: u64,

    pub cylinders: u16,
    pub sectors: u16,
    pub heads: u16,
}

impl Disk {
    /// maps a cylinder/head/sector triple to a logical block address.
    /// sector numbers are 1-based.
    fn lba(&self, cyl: u16, head: u8, sect: u8) -> u64 {
        (u64::from(cyl) * u64::from(self.heads) + u64::from(head)) * u64::from(self.sectors)
            + u64::from(sect) - 1
    }
}

/// floppy size classes and their geometry (cylinders, sectors, heads)
fn floppy_geometry(size: u64) -> (u16, u16, u16) {
    match size {
        163_840 => (40, 8, 1),
        368_640 => (40, 9, 2),
        737_280 => (80, 9, 2),
        1_228_800 => (80, 15, 2),
        _ => (80, 18, 2),
    }
}

/// mass storage (disk, floppy) and the int 13h service on top of it
pub struct Storage {
    disks: Vec<Option<Disk>>,

    /// per-drive status of the most recent int 13h call, reported by AH=01
    last_ah: [u8; 256],
    last_cf: [bool; 256],

    /// number of inserted fixed disks
    pub hd_count: u8,

    pub boot_drive: u8,
}

impl Component for Storage {
    fn int(&mut self, int: u8, cpu: &mut CPU, mmu: &mut MMU) -> bool {
        if int != 0x13 {
            return false;
        }
        let dl = cpu.get_r8(R::DL);
        let (ah, cf) = match cpu.get_r8(R::AH) {
            0x00 => {
                // DISK - RESET DISK SYSTEM
                (STATUS_OK, false)
            }
            0x01 => {
                // DISK - GET STATUS OF LAST OPERATION
                (self.last_ah[dl as usize], self.last_cf[dl as usize])
            }
            0x02 => {
                // DISK - READ SECTOR(S) INTO MEMORY
                // AL = number of sectors, CH = low bits of cylinder,
                // CL = sector | high bits of cylinder, DH = head,
                // ES:BX = destination
                let (cyl, sect, head, count) = chs_from_regs(cpu);
                let (transferred, ah, cf) = self.read_sectors(
                    mmu, dl, cyl, sect, head, count,
                    cpu.get_r16(R::ES), cpu.get_r16(R::BX));
                cpu.set_r8(R::AL, transferred);
                (ah, cf)
            }
            0x03 => {
                // DISK - WRITE SECTOR(S) FROM MEMORY
                let (cyl, sect, head, count) = chs_from_regs(cpu);
                let (transferred, ah, cf) = self.write_sectors(
                    mmu, dl, cyl, sect, head, count,
                    cpu.get_r16(R::ES), cpu.get_r16(R::BX));
                cpu.set_r8(R::AL, transferred);
                (ah, cf)
            }
            0x04 | 0x05 => {
                // DISK - VERIFY / FORMAT TRACK, reported as success
                (STATUS_OK, false)
            }
            0x08 => {
                // DISK - GET DRIVE PARAMETERS
                match &self.disks[dl as usize] {
                    Some(disk) => {
                        cpu.set_r8(R::CH, (disk.cylinders - 1) as u8);
                        cpu.set_r8(R::CL, disk.sectors as u8 | ((disk.cylinders / 256) << 6) as u8);
                        cpu.set_r8(R::DH, (disk.heads - 1) as u8);
                        if dl & 0x80 != 0 {
                            cpu.set_r8(R::DL, self.hd_count);
                        } else {
                            cpu.set_r8(R::DL, 2);
                            cpu.set_r8(R::BL, 4);
                        }
                        (STATUS_OK, false)
                    }
                    None => (STATUS_NO_MEDIA, true),
                }
            }
            _ => (STATUS_BAD_COMMAND, true),
        };

        cpu.set_r8(R::AH, ah);
        cpu.regs.flags.carry = cf;

        self.last_ah[dl as usize] = ah;
        self.last_cf[dl as usize] = cf;
        if dl & 0x80 != 0 {
            // fixed disk status is mirrored in the bios data area
            mmu.write_u8_at(BIOS::DATA_DISK_STATUS, ah);
        }
        true
    }
}

/// decodes the int 13h CHS registers: the top two bits of CL extend the
/// cylinder number
fn chs_from_regs(cpu: &CPU) -> (u16, u8, u8, u8) {
    let cl = cpu.get_r8(R::CL);
    let cyl = u16::from(cpu.get_r8(R::CH)) | u16::from(cl & 0xC0) << 2;
    let sect = cl & 0x3F;
    (cyl, sect, cpu.get_r8(R::DH), cpu.get_r8(R::AL))
}

impl Storage {
    pub fn default() -> Self {
        let mut disks = Vec::with_capacity(256);
        for _ in 0..256 {
            disks.push(None);
        }
        Storage {
            disks,
            last_ah: [0; 256],
            last_cf: [false; 256],
            hd_count: 0,
            boot_drive: 0,
        }
    }

    /// Inserts a disk image into a drive slot. A `\\` path prefix selects
    /// raw device mode; everything else is opened as an image file in
    /// read-write-binary mode. Geometry is derived from the byte size:
    /// floppies by size class, fixed disks as 63 sectors x 16 heads.
    /// Replacing an inserted disk closes the prior handle first.
    pub fn insert(&mut self, num: u8, path: &str) -> Result<(), DiskError> {
        let raw_device = path.starts_with("\\\\");
        let mut backing = OpenOptions::new().read(true).write(true).open(path)?;

        // raw devices do not report a useful metadata length, so the size
        // of either backing kind is queried by seeking to the end
        let size = backing.seek(SeekFrom::End(0))?;
        if size < SECTOR_SIZE as u64 {
            return Err(DiskError::TooSmall);
        }

        let (cylinders, sectors, heads) = if num < FIRST_HD {
            floppy_geometry(size)
        } else {
            let cyls = size / (63 * 16 * SECTOR_SIZE as u64);
            (cyls as u16, 63, 16)
        };
        if DEBUG_DISK {
            println!("insert drive {:02X}: {} bytes, chs {}/{}/{}", num, size, cylinders, heads, sectors);
        }

        self.disks[num as usize] = Some(Disk {
            backing,
            raw_device,
            size,
            cylinders,
            sectors,
            heads,
        });
        self.count_hard_disks();
        Ok(())
    }

    /// removes a disk and closes its backing handle
    pub fn eject(&mut self, num: u8) {
        self.disks[num as usize] = None;
        self.count_hard_disks();
    }

    pub fn is_inserted(&self, num: u8) -> bool {
        self.disks[num as usize].is_some()
    }

    pub fn disk(&self, num: u8) -> Option<&Disk> {
        self.disks[num as usize].as_ref()
    }

    fn count_hard_disks(&mut self) {
        self.hd_count = self.disks[FIRST_HD as usize..]
            .iter()
            .filter(|d| d.is_some())
            .count() as u8;
    }

    /// Reads `count` sectors from the drive into guest memory at seg:off.
    /// Each byte goes through the mmu so rom regions stay intact.
    /// Returns sectors transferred, AH status and the carry flag.
    pub fn read_sectors(&mut self, mmu: &mut MMU, num: u8, cyl: u16, sect: u8, head: u8,
                        count: u8, seg: u16, off: u16) -> (u8, u8, bool) {
        let disk = match self.disks[num as usize].as_mut() {
            Some(disk) => disk,
            None => return (0, STATUS_BAD_COMMAND, true),
        };
        if sect == 0 {
            return (0, STATUS_SECTOR_NOT_FOUND, true);
        }
        let file_offset = disk.lba(cyl, head, sect) * SECTOR_SIZE as u64;
        if file_offset > disk.size {
            return (0, STATUS_SECTOR_NOT_FOUND, true);
        }
        if disk.backing.seek(SeekFrom::Start(file_offset)).is_err() {
            return (0, STATUS_SECTOR_NOT_FOUND, true);
        }

        let mut dst = (u32::from(seg) << 4).wrapping_add(u32::from(off)) & 0xF_FFFF;
        let mut transferred = 0;
        for _ in 0..count {
            let mut buf = [0u8; SECTOR_SIZE];
            if disk.backing.read_exact(&mut buf).is_err() {
                // short read: stop at the failing sector, report the rest
                break;
            }
            for b in buf.iter() {
                mmu.write_u8_at(dst, *b);
                dst = dst.wrapping_add(1) & 0xF_FFFF;
            }
            transferred += 1;
        }
        (transferred, STATUS_OK, false)
    }

    /// Writes `count` sectors from guest memory at seg:off to the drive.
    /// The source bytes are read through the mmu into a local buffer
    /// before they are handed to the host.
    pub fn write_sectors(&mut self, mmu: &mut MMU, num: u8, cyl: u16, sect: u8, head: u8,
                         count: u8, seg: u16, off: u16) -> (u8, u8, bool) {
        let disk = match self.disks[num as usize].as_mut() {
            Some(disk) => disk,
            None => return (0, STATUS_BAD_COMMAND, true),
        };
        if sect == 0 {
            return (0, STATUS_SECTOR_NOT_FOUND, true);
        }
        let file_offset = disk.lba(cyl, head, sect) * SECTOR_SIZE as u64;
        if file_offset > disk.size {
            return (0, STATUS_SECTOR_NOT_FOUND, true);
        }
        if disk.backing.seek(SeekFrom::Start(file_offset)).is_err() {
            return (0, STATUS_SECTOR_NOT_FOUND, true);
        }

        let mut src = (u32::from(seg) << 4).wrapping_add(u32::from(off)) & 0xF_FFFF;
        let mut transferred = 0;
        for _ in 0..count {
            let mut buf = [0u8; SECTOR_SIZE];
            for b in buf.iter_mut() {
                *b = mmu.read_u8_at(src);
                src = src.wrapping_add(1) & 0xF_FFFF;
            }
            if disk.backing.write_all(&buf).is_err() {
                return (transferred, STATUS_WRITE_FAULT, true);
            }
            transferred += 1;
        }
        (transferred, STATUS_OK, false)
    }
}

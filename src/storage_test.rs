use std::fs;
use std::path::PathBuf;

use tempdir::TempDir;

use crate::cpu::{CPU, R};
use crate::machine::Component;
use crate::memory::MMU;
use crate::storage::{Storage, SECTOR_SIZE};

/// creates a disk image where every sector is filled with its sector
/// number (mod 256), so reads can be traced back to an LBA
fn image_with_markers(dir: &TempDir, name: &str, sectors: usize) -> PathBuf {
    let mut data = Vec::with_capacity(sectors * SECTOR_SIZE);
    for lba in 0..sectors {
        data.extend(std::iter::repeat(lba as u8).take(SECTOR_SIZE));
    }
    let path = dir.path().join(name);
    fs::write(&path, &data).unwrap();
    path
}

#[test]
fn floppy_geometry_by_size_class() {
    let tmp = TempDir::new("xtbox").unwrap();
    let sizes = [
        (163_840, (40, 8, 1)),
        (368_640, (40, 9, 2)),
        (737_280, (80, 9, 2)),
        (1_228_800, (80, 15, 2)),
        (1_474_560, (80, 18, 2)),
    ];
    for (i, (size, chs)) in sizes.iter().enumerate() {
        let path = tmp.path().join(format!("floppy{}.img", i));
        fs::write(&path, vec![0u8; *size]).unwrap();

        let mut storage = Storage::default();
        storage.insert(0, path.to_str().unwrap()).unwrap();
        let disk = storage.disk(0).unwrap();
        assert_eq!(*chs, (disk.cylinders, disk.sectors, disk.heads));
    }
}

#[test]
fn fixed_disk_geometry_from_size() {
    let tmp = TempDir::new("xtbox").unwrap();
    // 10 cylinders of 63 sectors x 16 heads
    let size = 10 * 63 * 16 * SECTOR_SIZE;
    let path = tmp.path().join("hd.img");
    fs::write(&path, vec![0u8; size]).unwrap();

    let mut storage = Storage::default();
    storage.insert(0x80, path.to_str().unwrap()).unwrap();
    let disk = storage.disk(0x80).unwrap();
    assert_eq!((10, 63, 16), (disk.cylinders, disk.sectors, disk.heads));
    assert_eq!(1, storage.hd_count);

    storage.eject(0x80);
    assert!(!storage.is_inserted(0x80));
    assert_eq!(0, storage.hd_count);
}

#[test]
fn insert_rejects_a_truncated_image() {
    let tmp = TempDir::new("xtbox").unwrap();
    let path = tmp.path().join("short.img");
    fs::write(&path, vec![0u8; 100]).unwrap();

    let mut storage = Storage::default();
    assert!(storage.insert(0, path.to_str().unwrap()).is_err());
}

#[test]
fn chs_to_lba_on_a_1440k_floppy() {
    let tmp = TempDir::new("xtbox").unwrap();
    let path = image_with_markers(&tmp, "floppy.img", 2880);

    let mut storage = Storage::default();
    let mut mmu = MMU::default();
    storage.insert(0, path.to_str().unwrap()).unwrap();

    // geometry 80/18/2: c=1 h=0 s=1 -> lba 36? no: (1*2+0)*18+1-1 = 36
    let cases = [
        ((0, 1, 0), 0u8),
        ((1, 1, 0), 36),
        ((0, 1, 1), 18),
        ((1, 18, 1), 71),
    ];
    for ((cyl, sect, head), lba) in cases.iter() {
        let (transferred, ah, cf) = storage.read_sectors(&mut mmu, 0, *cyl, *sect, *head, 1, 0x1000, 0);
        assert_eq!((1, 0, false), (transferred, ah, cf));
        assert_eq!(*lba, mmu.read_u8(0x1000, 0));
        assert_eq!(*lba, mmu.read_u8(0x1000, 511));
    }
}

#[test]
fn sector_zero_is_rejected() {
    let tmp = TempDir::new("xtbox").unwrap();
    let path = image_with_markers(&tmp, "floppy.img", 720);

    let mut storage = Storage::default();
    let mut mmu = MMU::default();
    storage.insert(0, path.to_str().unwrap()).unwrap();

    let (transferred, _, cf) = storage.read_sectors(&mut mmu, 0, 0, 0, 0, 1, 0x1000, 0);
    assert_eq!(0, transferred);
    assert!(cf);
}

#[test]
fn read_past_end_of_image_reports_what_transferred() {
    let tmp = TempDir::new("xtbox").unwrap();
    let path = image_with_markers(&tmp, "floppy.img", 360);

    let mut storage = Storage::default();
    let mut mmu = MMU::default();
    storage.insert(0, path.to_str().unwrap()).unwrap();

    // last sector of a 184320 byte image is lba 359 = c=19 h=1 s=9
    // with geometry 80/18/2 (size fallback class): request 4, only 1 exists
    let (transferred, _, cf) = storage.read_sectors(&mut mmu, 0, 9, 18, 1, 4, 0x1000, 0);
    assert_eq!(1, transferred);
    assert!(!cf);
}

#[test]
fn write_read_roundtrip_through_guest_memory() {
    let tmp = TempDir::new("xtbox").unwrap();
    let path = image_with_markers(&tmp, "floppy.img", 720);

    let mut storage = Storage::default();
    let mut mmu = MMU::default();
    storage.insert(0, path.to_str().unwrap()).unwrap();

    for i in 0..SECTOR_SIZE as u16 {
        mmu.write_u8(0x2000, i, (i % 251) as u8);
    }
    let (transferred, _, cf) = storage.write_sectors(&mut mmu, 0, 2, 3, 1, 1, 0x2000, 0);
    assert_eq!((1, false), (transferred, cf));

    let (transferred, _, cf) = storage.read_sectors(&mut mmu, 0, 2, 3, 1, 1, 0x3000, 0);
    assert_eq!((1, false), (transferred, cf));
    for i in 0..SECTOR_SIZE as u16 {
        assert_eq!((i % 251) as u8, mmu.read_u8(0x3000, i));
    }
}

#[test]
fn disk_reads_do_not_clobber_rom() {
    let tmp = TempDir::new("xtbox").unwrap();
    let path = image_with_markers(&tmp, "floppy.img", 720);

    let mut storage = Storage::default();
    let mut mmu = MMU::default();
    mmu.memory.write_unprotected(0xF_0000, &[0xEE; SECTOR_SIZE]);
    mmu.memory.set_readonly(0xF_0000, SECTOR_SIZE);
    storage.insert(0, path.to_str().unwrap()).unwrap();

    let (transferred, _, cf) = storage.read_sectors(&mut mmu, 0, 0, 2, 0, 1, 0xF000, 0);
    assert_eq!((1, false), (transferred, cf));
    for i in 0..SECTOR_SIZE as u32 {
        assert_eq!(0xEE, mmu.read_u8_at(0xF_0000 + i));
    }
}

#[test]
fn int13_get_parameters() {
    let tmp = TempDir::new("xtbox").unwrap();
    let path = image_with_markers(&tmp, "floppy.img", 2880);

    let mut storage = Storage::default();
    let mut mmu = MMU::default();
    let mut cpu = CPU::default();
    storage.insert(0, path.to_str().unwrap()).unwrap();

    cpu.set_r8(R::AH, 0x08);
    cpu.set_r8(R::DL, 0x00);
    assert!(storage.int(0x13, &mut cpu, &mut mmu));
    assert_eq!(79, cpu.get_r8(R::CH));
    assert_eq!(18, cpu.get_r8(R::CL));
    assert_eq!(1, cpu.get_r8(R::DH));
    assert_eq!(2, cpu.get_r8(R::DL));
    assert_eq!(4, cpu.get_r8(R::BL));
    assert_eq!(0, cpu.get_r8(R::AH));
    assert!(!cpu.regs.flags.carry);

    // an empty slot reports no media
    cpu.set_r8(R::AH, 0x08);
    cpu.set_r8(R::DL, 0x01);
    storage.int(0x13, &mut cpu, &mut mmu);
    assert_eq!(0xAA, cpu.get_r8(R::AH));
    assert!(cpu.regs.flags.carry);
}

#[test]
fn int13_tracks_last_status_per_drive() {
    let tmp = TempDir::new("xtbox").unwrap();
    let path = image_with_markers(&tmp, "hd.img", 63 * 16 * 2);

    let mut storage = Storage::default();
    let mut mmu = MMU::default();
    let mut cpu = CPU::default();
    storage.insert(0x80, path.to_str().unwrap()).unwrap();

    // a failing call on the fixed disk mirrors AH to 0040:0074
    cpu.set_r8(R::AH, 0x42);
    cpu.set_r8(R::DL, 0x80);
    storage.int(0x13, &mut cpu, &mut mmu);
    assert!(cpu.regs.flags.carry);
    let failed_status = cpu.get_r8(R::AH);
    assert_eq!(failed_status, mmu.read_u8_at(0x474));

    // AH=01 recalls it
    cpu.set_r8(R::AH, 0x01);
    cpu.regs.flags.carry = false;
    storage.int(0x13, &mut cpu, &mut mmu);
    assert_eq!(failed_status, cpu.get_r8(R::AH));
    assert!(cpu.regs.flags.carry);

    // a reset succeeds and clears the recorded status
    cpu.set_r8(R::AH, 0x00);
    storage.int(0x13, &mut cpu, &mut mmu);
    assert_eq!(0, cpu.get_r8(R::AH));
    assert!(!cpu.regs.flags.carry);
}

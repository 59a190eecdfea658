// Hand over to the softloader or ROM bootloader.
use core::mem::MaybeUninit;
use defmt::info;
use interceptor_core::boot::BootMode;

// Left alone by the runtime's RAM init, so the magic survives the reset
#[link_section = ".uninit.BOOT_MAGIC"]
static mut BOOT_MAGIC: MaybeUninit<u32> = MaybeUninit::uninit();

pub fn reset_into(mode: BootMode) -> ! {
    info!("Resetting into {:?}", mode);
    unsafe {
        core::ptr::addr_of_mut!(BOOT_MAGIC)
            .cast::<u32>()
            .write_volatile(mode.magic());
    }
    cortex_m::peripheral::SCB::sys_reset()
}

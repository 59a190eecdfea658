use can_bit_timings::CanBitTiming;
use core::cmp::min;
use defmt::{error, info, warn};
use embedded_can::StandardId as EmbeddedStandardId;
use fdcan::config::FrameTransmissionConfig::ClassicCanOnly;
use fdcan::config::NominalBitTiming;
use fdcan::filter::{StandardFilter, StandardFilterSlot};
use fdcan::frame::{FrameFormat, TxFrameHeader};
use fdcan::id::{Id, StandardId};
use fdcan::interrupt::{Interrupt, InterruptLine, Interrupts};
use fdcan::{Fifo0, FdCanControl, Mailbox, NormalOperationMode, ReceiveOverrun};
use interceptor_core::hal::TxSlot;
use stm32g4xx_hal::stm32;

use crate::hardware::PCAN;

// Module to support interrupt driven CAN on rtic
//
// No software queues: the interceptor only ever has one frame of its own
// in flight, and received commands are handled directly in the IRQ.
//
// Currently not very abstract: uses STM32G4 FDCAN1 peripheral directly.

const ERROR_INTERRUPTS: [Interrupt; 3] = [
    Interrupt::BusOff,
    Interrupt::ErrPassive,
    Interrupt::WarningStatus,
];

pub fn init(mut can: fdcan::FdCan<PCAN, fdcan::ConfigMode>, bit_timings: &CanBitTiming) -> (Control, Rx, Tx) {
    // Convert the generic bit timings to FDCAN bit timings
    let btr = NominalBitTiming {
        prescaler: bit_timings.prescaler.try_into().unwrap(),
        seg1: bit_timings.bs1.try_into().unwrap(),
        seg2: bit_timings.bs2.try_into().unwrap(),
        sync_jump_width: bit_timings.sjw.try_into().unwrap(),
    };

    can.set_protocol_exception_handling(false);
    can.set_nominal_bit_timing(btr);
    can.set_standard_filter(
        StandardFilterSlot::_0,
        StandardFilter::accept_all_into_fifo0(),
    );
    can.set_frame_transmit(ClassicCanOnly);
    can.enable_interrupts(
        Interrupts::RX_FIFO0_NEW_MSG
            | Interrupts::BUS_OFF
            | Interrupts::ERR_PASSIVE
            | Interrupts::WARNING_STATUS,
    );
    can.enable_interrupt_line(InterruptLine::_0, true);
    info!("-- Current Config: {:#?}", can.get_config());
    let can = can.into_normal();

    let (can_control, can_tx, can_rx, _can_rx1) = can.split();

    (Control { can: can_control }, Rx { can: can_rx }, Tx { can: can_tx })
}

pub struct Control {
    can: FdCanControl<PCAN, NormalOperationMode>,
}

impl Control {
    // Acknowledge a pending "new message" interrupt, returns true if there was one
    pub fn take_rx_pending(&mut self) -> bool {
        let pending = self.can.has_interrupt(Interrupt::RxFifo0NewMsg);
        if pending {
            self.can.clear_interrupt(Interrupt::RxFifo0NewMsg);
        }
        pending
    }

    // Acknowledge any bus error interrupts, returns true if there were some
    pub fn take_bus_errors(&mut self) -> bool {
        let mut any = false;
        for interrupt in ERROR_INTERRUPTS {
            if self.can.has_interrupt(interrupt) {
                self.can.clear_interrupt(interrupt);
                any = true;
            }
        }
        if any {
            let counters = self.can.error_counters();
            error!(
                "CAN bus error tec {} rec {}",
                counters.transmit_err, counters.receive_err
            );
        }
        any
    }
}

// Currently only supports receiving from FIFO0
pub struct Rx {
    can: fdcan::Rx<PCAN, NormalOperationMode, Fifo0>,
}

impl Rx {
    // Drain FIFO0, passing each standard ID frame to on_frame
    pub fn drain(&mut self, mut on_frame: impl FnMut(u16, &[u8])) {
        let mut buffer = [0_u8; 8];
        loop {
            let info = match self.can.receive(buffer.as_mut_slice()) {
                Ok(ReceiveOverrun::NoOverrun(info)) => info,
                Ok(ReceiveOverrun::Overrun(info)) => {
                    // Older frames were dropped by the hardware, this one is still good
                    warn!("CAN RX overrun reported");
                    info
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(never)) => match never {},
            };
            if let Id::Standard(id) = info.id {
                let len = min(info.len as usize, buffer.len());
                on_frame(id.as_raw(), &buffer[..len]);
            }
        }
    }
}

pub struct Tx {
    can: fdcan::Tx<PCAN, NormalOperationMode>,
}

impl Tx {
    // Cancel everything still waiting in the TX buffers
    pub fn abort_pending(&mut self) {
        for mailbox in [Mailbox::_0, Mailbox::_1, Mailbox::_2] {
            self.can.abort(mailbox);
        }
    }
}

impl TxSlot for Tx {
    fn is_free(&self) -> bool {
        // No pending transmission requests in any TX buffer.
        // SAFETY: TXBRP is read-only and only this Tx half ever sets bits
        // in it (via TXBAR), so the read has no side effects on the
        // peripheral and cannot race a write from Control or Rx.
        let fdcan = unsafe { &(*stm32::FDCAN1::ptr()) };
        fdcan.txbrp.read().bits() == 0
    }

    fn submit(&mut self, id: EmbeddedStandardId, data: &[u8]) {
        let Some(id) = StandardId::new(id.as_raw()) else {
            return;
        };
        let header = TxFrameHeader {
            len: data.len() as u8,
            frame_format: FrameFormat::Standard,
            id: Id::Standard(id),
            bit_rate_switching: false,
            marker: None,
        };
        if let Err(nb::Error::WouldBlock) = self.can.transmit(header, data) {
            warn!("CAN TX buffers full");
        }
    }
}

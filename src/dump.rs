use std::io::{self, Write};

use crate::{block::BlockHeader, pool::PagePool, Pointer};

/// Renders a link the way the dump format wants it: a bare hex address,
/// or `0` for the null links at the ends of a page.
fn link(pointer: Pointer<BlockHeader>) -> String {
    match pointer {
        Some(node) => format!("{:x}", node.as_ptr() as usize),
        None => String::from("0"),
    }
}

impl PagePool {
    /// Writes a textual dump of every page to `sink` for debugging.
    ///
    /// For each page a `Page : <n>` banner is emitted, followed by one
    /// record per block in address order: the header address, both links,
    /// the payload size, the availability flag, and a byte-by-byte
    /// rendering of the payload. The format is stable, so dumps taken at
    /// the same point of two identical runs can be compared with a plain
    /// diff.
    ///
    /// Payload bytes are written raw, exactly as they sit in memory.
    /// Pages come back zeroed from the platform, so blocks that were
    /// never written to dump as zero bytes.
    ///
    /// This is a debugging aid; nothing in the pool depends on it.
    pub fn dump<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        for page in self.pages() {
            writeln!(sink, "Page : {}", page.index)?;

            unsafe {
                for block in page.blocks.iter() {
                    writeln!(sink, "Meta Data Address: {:x}", block.as_ptr() as usize)?;
                    writeln!(sink, "Next Node Address: {}", link(block.as_ref().next))?;
                    writeln!(sink, "Prev Node Address: {}", link(block.as_ref().prev))?;
                    writeln!(sink, "Memory Size : {}", block.as_ref().size)?;
                    writeln!(sink, "Availability : {}", block.as_ref().available as u8)?;
                    writeln!(sink, "Address\t|\tMemory Content")?;

                    let payload = BlockHeader::payload_address_of(block).as_ptr();
                    for offset in 0..block.as_ref().size {
                        write!(sink, "{:x}\t|\t", payload as usize + offset)?;
                        sink.write_all(&[*payload.add(offset)])?;
                        writeln!(sink)?;
                    }

                    writeln!(sink)?;
                }
            }

            writeln!(sink)?;
        }

        Ok(())
    }
}

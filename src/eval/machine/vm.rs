//! The machine: registers, program counter and the fetch / decode /
//! dispatch loop

use crate::eval::{
    channel::{InputChannel, OutputChannel},
    error::ExecutionError,
    memory::heap::{Heap, HeapStats, PROGRAM},
};

use super::{
    instruction::{Instruction, Reg},
    metrics::Metrics,
};

/// Register value delivered by input once the stream is exhausted
pub const END_OF_INPUT: u32 = u32::MAX;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Registers, program counter and run state
#[derive(Debug, Default, Clone)]
pub struct MachineState {
    /// General purpose registers
    registers: [u32; REGISTER_COUNT],
    /// Offset of the next instruction in the program
    pc: u32,
    /// Set by halt, never cleared
    terminated: bool,
}

impl MachineState {
    pub fn registers(&self) -> &[u32; REGISTER_COUNT] {
        &self.registers
    }

    pub fn register(&self, r: Reg) -> u32 {
        self.registers[r]
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Fetch, decode and execute the instruction at the program counter
    ///
    /// Errors from decoding or executing are traced with the offset
    /// and word of the offending instruction. A failed fetch is traced
    /// with the offset alone.
    fn handle_instruction(
        &mut self,
        heap: &mut Heap,
        input: &mut dyn InputChannel,
        output: &mut dyn OutputChannel,
        metrics: &mut Metrics,
    ) -> Result<(), ExecutionError> {
        let pc = self.pc;
        let word = heap
            .fetch(pc)
            .map_err(|e| ExecutionError::Unfetchable(Box::new(ExecutionError::Heap(e)), pc))?;

        Instruction::decode(word)
            .and_then(|instruction| self.execute(instruction, heap, input, output, metrics))
            .map_err(|e| ExecutionError::Traced(Box::new(e), pc, word))
    }

    fn execute(
        &mut self,
        instruction: Instruction,
        heap: &mut Heap,
        input: &mut dyn InputChannel,
        output: &mut dyn OutputChannel,
        metrics: &mut Metrics,
    ) -> Result<(), ExecutionError> {
        let r = &mut self.registers;

        match instruction {
            Instruction::ConditionalMove { a, b, c } => {
                if r[c] != 0 {
                    r[a] = r[b];
                }
            }
            Instruction::ArrayIndex { a, b, c } => {
                r[a] = heap.read(r[b], r[c])?;
            }
            Instruction::ArrayAmendment { a, b, c } => {
                heap.write(r[a], r[b], r[c])?;
            }
            Instruction::Addition { a, b, c } => {
                r[a] = r[b].wrapping_add(r[c]);
            }
            Instruction::Multiplication { a, b, c } => {
                r[a] = r[b].wrapping_mul(r[c]);
            }
            Instruction::Division { a, b, c } => {
                r[a] = r[b]
                    .checked_div(r[c])
                    .ok_or(ExecutionError::DivisionByZero)?;
            }
            Instruction::NotAnd { a, b, c } => {
                r[a] = !(r[b] & r[c]);
            }
            Instruction::Halt => {
                self.terminated = true;
                return Ok(());
            }
            Instruction::Allocation { b, c } => {
                r[b] = heap.allocate(r[c])?;
                metrics.alloc(heap.live_segments());
            }
            Instruction::Abandonment { c } => {
                heap.free(r[c])?;
                metrics.free();
            }
            Instruction::Output { c } => {
                // only the low byte is written
                output.write_byte(r[c] as u8)?;
                metrics.byte_out();
            }
            Instruction::Input { c } => {
                r[c] = match input.read_byte()? {
                    Some(byte) => {
                        metrics.byte_in();
                        u32::from(byte)
                    }
                    None => END_OF_INPUT,
                };
            }
            Instruction::LoadProgram { b, c } => {
                if r[b] != PROGRAM {
                    heap.replace_program(r[b])?;
                    metrics.program_load();
                }
                self.pc = r[c];
                return Ok(());
            }
            Instruction::LoadImmediate { a, value } => {
                r[a] = value;
            }
        }

        self.pc = self.pc.wrapping_add(1);
        Ok(())
    }
}

/// The machine
///
/// Owns the heap (and so every array including the program) and the
/// console channels.
pub struct Machine<'a> {
    /// All addressable memory
    heap: Heap,
    /// The current state of the machine - operated on as mutable ref
    state: MachineState,
    /// Where input instructions read from
    input: Box<dyn InputChannel + 'a>,
    /// Where output instructions write to
    output: Box<dyn OutputChannel + 'a>,
    /// Metrics
    metrics: Metrics,
}

impl<'a> Machine<'a> {
    /// Construct a machine to run `program`
    pub fn new(
        program: Vec<u32>,
        input: Box<dyn InputChannel + 'a>,
        output: Box<dyn OutputChannel + 'a>,
    ) -> Self {
        Machine::with_heap(Heap::new(program), input, output)
    }

    /// Construct a machine over a prepared heap, running the program
    /// in its segment 0
    pub fn with_heap(
        heap: Heap,
        input: Box<dyn InputChannel + 'a>,
        output: Box<dyn OutputChannel + 'a>,
    ) -> Self {
        let metrics = Metrics::new(heap.live_segments());
        Machine {
            heap,
            state: MachineState::default(),
            input,
            output,
            metrics,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Occupancy of the heap
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn registers(&self) -> &[u32; REGISTER_COUNT] {
        self.state.registers()
    }

    pub fn pc(&self) -> u32 {
        self.state.pc()
    }

    pub fn terminated(&self) -> bool {
        self.state.terminated()
    }

    /// Access the metrics (ticks, allocs, etc.)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Execute one step
    ///
    /// Stepping a halted machine does nothing.
    pub fn step(&mut self) -> Result<(), ExecutionError> {
        if self.state.terminated {
            return Ok(());
        }

        self.metrics.tick();
        self.state.handle_instruction(
            &mut self.heap,
            self.input.as_mut(),
            self.output.as_mut(),
            &mut self.metrics,
        )
    }

    /// Run the machine until halt, error or step limit
    pub fn run(&mut self, limit: Option<usize>) -> Result<(), ExecutionError> {
        while !self.state.terminated {
            if let Some(limit) = limit {
                if self.metrics.ticks() as usize >= limit {
                    return Err(ExecutionError::DidntTerminate(limit));
                }
            }

            self.step()?;
        }

        Ok(())
    }
}

mod orch_runner;
mod orch_turn_spec;

pub mod esn;

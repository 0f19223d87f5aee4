pub mod mackey_glass;

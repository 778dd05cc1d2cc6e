fn main() {
    entcomp::build::build!();
}

fn main() {
    salvo::cli::run();
}

use alloy_sol_types::sol;

sol! {
    #[allow(missing_docs)]
    interface Safe {
        function VERSION() external view returns (string memory);

        function nonce() external view returns (uint256);

        function getOwners() external view returns (address[] memory);

        function getThreshold() external view returns (uint256);

        function isOwner(address owner) external view returns (bool);

        function getTransactionHash(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address refundReceiver,
            uint256 _nonce
        ) external view returns (bytes32);

        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address refundReceiver,
            bytes memory signatures
        ) external payable returns (bool success);
    }
}
